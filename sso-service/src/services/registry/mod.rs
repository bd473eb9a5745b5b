//! Durable stores of registered services.

mod in_memory;
mod json;
mod redis;

pub use self::redis::RedisServiceRegistry;
pub use in_memory::InMemoryServiceRegistry;
pub use json::JsonServiceRegistry;

use async_trait::async_trait;

use crate::models::RegisteredService;
use crate::services::error::RegistryError;

/// Backing store for registered services.
///
/// `load_all` must return a full snapshot in a stable order on every call.
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    async fn load_all(&self) -> Result<Vec<RegisteredService>, RegistryError>;

    /// Insert, or replace the entry with the same id.
    async fn save(&self, service: RegisteredService) -> Result<RegisteredService, RegistryError>;

    async fn delete(&self, id: i64) -> Result<bool, RegistryError>;

    async fn size(&self) -> Result<usize, RegistryError>;

    /// Short backend name used in logs and health output.
    fn name(&self) -> &'static str;
}
