//! In-memory view of the service registry used on the request path.

use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::error::RegistryError;
use super::registry::ServiceRegistry;
use crate::models::RegisteredService;

type Snapshot = Vec<Arc<RegisteredService>>;

/// Caches registered services and answers "which service is this?".
///
/// Readers load the current snapshot without locking. `load` builds a new
/// snapshot and swaps it in whole; writers are serialized by `reload_lock`.
#[derive(Clone)]
pub struct ServicesManager {
    registry: Arc<dyn ServiceRegistry>,
    services: Arc<ArcSwap<Snapshot>>,
    reload_lock: Arc<Mutex<()>>,
}

impl ServicesManager {
    pub fn new(registry: Arc<dyn ServiceRegistry>) -> Self {
        Self {
            registry,
            services: Arc::new(ArcSwap::from_pointee(Vec::new())),
            reload_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Replace the cache with a fresh snapshot of the registry.
    ///
    /// On error the previous snapshot stays visible.
    pub async fn load(&self) -> Result<usize, RegistryError> {
        let _guard = self.reload_lock.lock().await;

        let mut loaded = self.registry.load_all().await.map_err(|e| {
            tracing::error!(
                registry = self.registry.name(),
                error = %e,
                "Failed to load services from registry"
            );
            e
        })?;

        // Stable: equal evaluation orders keep registry order
        loaded.sort_by_key(|s| s.evaluation_order);
        let snapshot: Snapshot = loaded.into_iter().map(Arc::new).collect();
        let count = snapshot.len();
        self.services.store(Arc::new(snapshot));

        tracing::info!(
            registry = self.registry.name(),
            count,
            "Loaded registered services"
        );
        Ok(count)
    }

    /// First cached service whose pattern matches `identifier`.
    pub fn find_service_by(&self, identifier: &str) -> Option<Arc<RegisteredService>> {
        self.services
            .load()
            .iter()
            .find(|s| s.matches(identifier))
            .cloned()
    }

    pub fn find_service_by_id(&self, id: i64) -> Option<Arc<RegisteredService>> {
        self.services.load().iter().find(|s| s.id == id).cloned()
    }

    pub fn all_services(&self) -> Vec<Arc<RegisteredService>> {
        self.services.load_full().as_ref().clone()
    }

    pub fn count(&self) -> usize {
        self.services.load().len()
    }

    /// Write through to the registry, then refresh the cache.
    pub async fn save(&self, service: RegisteredService) -> Result<RegisteredService, RegistryError> {
        let saved = self.registry.save(service).await?;
        self.load().await?;
        Ok(saved)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, RegistryError> {
        let removed = self.registry.delete(id).await?;
        if removed {
            self.load().await?;
        }
        Ok(removed)
    }

    /// Periodically reload in the background. Failures keep the old snapshot.
    pub fn spawn_scheduled_reload(&self, interval: Duration) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; startup already loaded.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = manager.load().await {
                    tracing::warn!(error = %e, "Scheduled service reload failed; keeping previous services");
                }
            }
        })
    }

    pub fn registry(&self) -> &Arc<dyn ServiceRegistry> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ServicePattern;
    use crate::services::registry::InMemoryServiceRegistry;

    fn manager(services: Vec<RegisteredService>) -> ServicesManager {
        ServicesManager::new(Arc::new(InMemoryServiceRegistry::new(services)))
    }

    #[tokio::test]
    async fn test_empty_before_load() {
        let m = manager(vec![RegisteredService::new(
            1,
            "a",
            ServicePattern::exact("a"),
        )]);
        assert_eq!(m.count(), 0);
        assert!(m.find_service_by("a").is_none());
        m.load().await.unwrap();
        assert!(m.find_service_by("a").is_some());
    }

    #[tokio::test]
    async fn test_first_match_wins_in_registry_order() {
        let m = manager(vec![
            RegisteredService::new(1, "first", ServicePattern::regex("https://.*").unwrap()),
            RegisteredService::new(2, "second", ServicePattern::exact("https://app")),
        ]);
        m.load().await.unwrap();
        assert_eq!(m.find_service_by("https://app").unwrap().id, 1);
    }

    #[tokio::test]
    async fn test_evaluation_order_takes_precedence() {
        let m = manager(vec![
            RegisteredService::new(1, "catch-all", ServicePattern::regex(".*").unwrap())
                .with_evaluation_order(100),
            RegisteredService::new(2, "specific", ServicePattern::exact("https://app")),
        ]);
        m.load().await.unwrap();
        assert_eq!(m.find_service_by("https://app").unwrap().id, 2);
        assert_eq!(m.find_service_by("https://other").unwrap().id, 1);
    }

    #[tokio::test]
    async fn test_no_match() {
        let m = manager(vec![RegisteredService::new(
            1,
            "a",
            ServicePattern::exact("a"),
        )]);
        m.load().await.unwrap();
        assert!(m.find_service_by("b").is_none());
        assert!(m.find_service_by_id(2).is_none());
        assert_eq!(m.find_service_by_id(1).unwrap().name, "a");
    }

    #[tokio::test]
    async fn test_load_is_wholesale_replace() {
        let registry = Arc::new(InMemoryServiceRegistry::new(vec![
            RegisteredService::new(1, "a", ServicePattern::exact("a")),
        ]));
        let m = ServicesManager::new(registry.clone());
        m.load().await.unwrap();

        registry.delete(1).await.unwrap();
        registry
            .save(RegisteredService::new(2, "b", ServicePattern::exact("b")))
            .await
            .unwrap();
        // Cache is untouched until the next load
        assert!(m.find_service_by("a").is_some());

        assert_eq!(m.load().await.unwrap(), 1);
        assert!(m.find_service_by("a").is_none());
        assert!(m.find_service_by("b").is_some());
    }

    #[tokio::test]
    async fn test_save_and_delete_refresh_cache() {
        let m = manager(vec![]);
        m.load().await.unwrap();
        m.save(RegisteredService::new(5, "x", ServicePattern::exact("x")))
            .await
            .unwrap();
        assert_eq!(m.count(), 1);
        assert!(m.delete(5).await.unwrap());
        assert_eq!(m.count(), 0);
    }
}
