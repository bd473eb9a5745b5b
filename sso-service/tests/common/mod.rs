//! Test helpers for sso-service integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use service_core::config::Config;
use sso_service::{
    build_router,
    config::{
        Environment, RegistryBackend, RegistryConfig, SecurityConfig, SsoConfig, SsoSettings,
        TicketConfig,
    },
    models::{
        Authentication, ExpirationPolicy, RegisteredService, ServicePattern, TicketGrantingTicket,
    },
    services::{
        DefaultTicketRegistry, InMemoryServiceRegistry, RegistryError, ServiceRegistry,
        ServicesManager, TicketRegistry,
    },
    AppState,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const TEST_ADMIN_API_KEY: &str = "test-admin-key-12345";

pub fn test_config() -> SsoConfig {
    SsoConfig {
        common: Config {
            port: 8080,
            host: "127.0.0.1".to_string(),
        },
        environment: Environment::Dev,
        service_name: "sso-service-test".to_string(),
        service_version: "0.0.0".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        registry: RegistryConfig {
            backend: RegistryBackend::Memory,
            json_path: None,
            reload_interval_seconds: 60,
            redis_scan_count: 100,
        },
        redis: None,
        tickets: TicketConfig {
            cleaner_interval_seconds: 120,
        },
        sso: SsoSettings {
            enabled: true,
            callback_url_prefix: Some("https://sso.example.org/oauth2/callback".to_string()),
        },
        security: SecurityConfig {
            admin_api_key: TEST_ADMIN_API_KEY.to_string(),
        },
    }
}

pub fn registered_service(id: i64, service_id: &str) -> RegisteredService {
    RegisteredService::new(id, service_id, ServicePattern::exact(service_id))
}

/// Registry whose reads can be switched to fail, standing in for an
/// unreachable backing store.
pub struct FlakyServiceRegistry {
    inner: InMemoryServiceRegistry,
    failing: AtomicBool,
}

impl FlakyServiceRegistry {
    pub fn new(services: Vec<RegisteredService>) -> Self {
        Self {
            inner: InMemoryServiceRegistry::new(services),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ServiceRegistry for FlakyServiceRegistry {
    async fn load_all(&self) -> Result<Vec<RegisteredService>, RegistryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RegistryError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "registry unreachable",
            )));
        }
        self.inner.load_all().await
    }

    async fn save(&self, service: RegisteredService) -> Result<RegisteredService, RegistryError> {
        self.inner.save(service).await
    }

    async fn delete(&self, id: i64) -> Result<bool, RegistryError> {
        self.inner.delete(id).await
    }

    async fn size(&self) -> Result<usize, RegistryError> {
        self.inner.size().await
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}

/// Application state over in-memory registries.
pub struct TestApp {
    pub state: AppState,
    pub registry: Arc<InMemoryServiceRegistry>,
    pub tickets: DefaultTicketRegistry,
}

impl TestApp {
    pub async fn spawn(services: Vec<RegisteredService>) -> Self {
        let registry = Arc::new(InMemoryServiceRegistry::new(services));
        let manager = ServicesManager::new(registry.clone());
        manager.load().await.expect("Failed to load services");

        let tickets = DefaultTicketRegistry::new();
        let state = AppState::new(test_config(), manager, Arc::new(tickets.clone()));

        Self {
            state,
            registry,
            tickets,
        }
    }

    pub fn router(&self) -> service_core::axum::Router {
        build_router(self.state.clone())
    }

    /// Store a live ticket-granting ticket and return its id.
    pub async fn create_ticket(&self, handlers: &[&str]) -> String {
        let mut authentication = Authentication::new("casuser");
        for handler in handlers {
            authentication.add_success(*handler);
        }
        let tgt = TicketGrantingTicket::new(authentication, ExpirationPolicy::default());
        let id = tgt.id.clone();
        self.tickets
            .add_ticket(tgt)
            .await
            .expect("Failed to add ticket");
        id
    }
}
