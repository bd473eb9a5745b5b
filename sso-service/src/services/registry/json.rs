use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::Mutex;

use super::ServiceRegistry;
use crate::models::RegisteredService;
use crate::services::error::RegistryError;

/// File-based registry: a JSON array of services, re-read on every load.
pub struct JsonServiceRegistry {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonServiceRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read(&self) -> Result<Vec<RegisteredService>, RegistryError> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    async fn read_or_empty(&self) -> Result<Vec<RegisteredService>, RegistryError> {
        match self.read().await {
            Err(RegistryError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            other => other,
        }
    }

    async fn write(&self, services: &[RegisteredService]) -> Result<(), RegistryError> {
        let body = serde_json::to_string_pretty(services)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl ServiceRegistry for JsonServiceRegistry {
    async fn load_all(&self) -> Result<Vec<RegisteredService>, RegistryError> {
        let services = self.read().await?;
        tracing::debug!(
            path = %self.path.display(),
            count = services.len(),
            "Read services from JSON registry"
        );
        Ok(services)
    }

    async fn save(&self, service: RegisteredService) -> Result<RegisteredService, RegistryError> {
        let _guard = self.write_lock.lock().await;
        let mut services = self.read_or_empty().await?;
        match services.iter_mut().find(|s| s.id == service.id) {
            Some(existing) => *existing = service.clone(),
            None => services.push(service.clone()),
        }
        self.write(&services).await?;
        Ok(service)
    }

    async fn delete(&self, id: i64) -> Result<bool, RegistryError> {
        let _guard = self.write_lock.lock().await;
        let mut services = self.read_or_empty().await?;
        let before = services.len();
        services.retain(|s| s.id != id);
        if services.len() == before {
            return Ok(false);
        }
        self.write(&services).await?;
        Ok(true)
    }

    async fn size(&self) -> Result<usize, RegistryError> {
        Ok(self.read().await?.len())
    }

    fn name(&self) -> &'static str {
        "json"
    }
}
