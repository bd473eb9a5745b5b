use async_trait::async_trait;
use std::sync::RwLock;

use super::ServiceRegistry;
use crate::models::RegisteredService;
use crate::services::error::RegistryError;

/// Registry held in process memory, in insertion order.
pub struct InMemoryServiceRegistry {
    services: RwLock<Vec<RegisteredService>>,
}

impl Default for InMemoryServiceRegistry {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl InMemoryServiceRegistry {
    pub fn new(services: Vec<RegisteredService>) -> Self {
        Self {
            services: RwLock::new(services),
        }
    }
}

#[async_trait]
impl ServiceRegistry for InMemoryServiceRegistry {
    async fn load_all(&self) -> Result<Vec<RegisteredService>, RegistryError> {
        let services = self
            .services
            .read()
            .map_err(|e| anyhow::anyhow!("In-memory registry lock poisoned: {}", e))?
            .clone();
        Ok(services)
    }

    async fn save(&self, service: RegisteredService) -> Result<RegisteredService, RegistryError> {
        let mut services = self
            .services
            .write()
            .map_err(|e| anyhow::anyhow!("In-memory registry lock poisoned: {}", e))?;
        match services.iter_mut().find(|s| s.id == service.id) {
            Some(existing) => *existing = service.clone(),
            None => services.push(service.clone()),
        }
        Ok(service)
    }

    async fn delete(&self, id: i64) -> Result<bool, RegistryError> {
        let mut services = self
            .services
            .write()
            .map_err(|e| anyhow::anyhow!("In-memory registry lock poisoned: {}", e))?;
        let before = services.len();
        services.retain(|s| s.id != id);
        Ok(services.len() != before)
    }

    async fn size(&self) -> Result<usize, RegistryError> {
        let len = self
            .services
            .read()
            .map_err(|e| anyhow::anyhow!("In-memory registry lock poisoned: {}", e))?
            .len();
        Ok(len)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
