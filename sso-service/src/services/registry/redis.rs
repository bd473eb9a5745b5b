use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client};

use super::ServiceRegistry;
use crate::config::RedisConfig;
use crate::models::RegisteredService;
use crate::services::error::RegistryError;

const SERVICE_KEY_PREFIX: &str = "sso:service:";

/// Registry keeping each service as a JSON document under `sso:service:{id}`.
#[derive(Clone)]
pub struct RedisServiceRegistry {
    _client: Client,
    manager: ConnectionManager,
    scan_count: usize,
}

impl RedisServiceRegistry {
    pub async fn new(config: &RedisConfig, scan_count: usize) -> Result<Self, RegistryError> {
        tracing::info!(url = %config.url, "Connecting to Redis service registry");
        let client = Client::open(config.url.clone())?;

        // Use ConnectionManager for automatic reconnection
        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!("Failed to get Redis connection manager: {}", e);
            e
        })?;

        tracing::info!("Successfully connected to Redis service registry");

        Ok(Self {
            _client: client,
            manager,
            scan_count,
        })
    }

    fn key(id: i64) -> String {
        format!("{}{}", SERVICE_KEY_PREFIX, id)
    }

    pub async fn health_check(&self) -> Result<(), RegistryError> {
        let mut conn = self.manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn scan_keys(&self) -> Result<Vec<String>, RegistryError> {
        let mut conn = self.manager.clone();
        let pattern = format!("{}*", SERVICE_KEY_PREFIX);
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(self.scan_count)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}

#[async_trait]
impl ServiceRegistry for RedisServiceRegistry {
    async fn load_all(&self) -> Result<Vec<RegisteredService>, RegistryError> {
        let keys = self.scan_keys().await?;
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.manager.clone();
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await?;

        let mut services: Vec<RegisteredService> = keys
            .iter()
            .zip(values)
            .filter_map(|(key, value)| {
                // Key removed between SCAN and MGET
                let json = value?;
                match serde_json::from_str::<RegisteredService>(&json) {
                    Ok(service) => Some(service),
                    Err(e) => {
                        tracing::error!(key = %key, error = %e, "Skipping unreadable service entry");
                        None
                    }
                }
            })
            .collect();

        services.sort_by_key(|s| s.id);
        Ok(services)
    }

    async fn save(&self, service: RegisteredService) -> Result<RegisteredService, RegistryError> {
        let mut conn = self.manager.clone();
        let json = serde_json::to_string(&service)?;
        let _: () = redis::cmd("SET")
            .arg(Self::key(service.id))
            .arg(json)
            .query_async(&mut conn)
            .await?;
        Ok(service)
    }

    async fn delete(&self, id: i64) -> Result<bool, RegistryError> {
        let mut conn = self.manager.clone();
        let removed: i64 = redis::cmd("DEL")
            .arg(Self::key(id))
            .query_async(&mut conn)
            .await?;
        Ok(removed > 0)
    }

    async fn size(&self) -> Result<usize, RegistryError> {
        Ok(self.scan_keys().await?.len())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
