use service_core::error::AppError;
use service_core::observability::init_tracing;
use sso_service::{
    build_router,
    config::{RegistryBackend, SsoConfig},
    services::{
        DefaultTicketRegistry, InMemoryServiceRegistry, JsonServiceRegistry, RedisServiceRegistry,
        ServiceRegistry, ServicesManager,
    },
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = SsoConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        registry = ?config.registry.backend,
        "Starting SSO service"
    );

    let registry = build_service_registry(&config).await?;
    let services_manager = ServicesManager::new(registry);

    // A registry that cannot be read at startup is fatal
    services_manager.load().await?;
    let _reload_task = services_manager.spawn_scheduled_reload(Duration::from_secs(
        config.registry.reload_interval_seconds,
    ));

    let ticket_registry = DefaultTicketRegistry::new();
    let _cleaner_task = ticket_registry.spawn_cleaner(Duration::from_secs(
        config.tickets.cleaner_interval_seconds,
    ));
    tracing::info!("Ticket registry initialized");

    let state = AppState::new(config.clone(), services_manager, Arc::new(ticket_registry));
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.common.host, config.common.port)
        .parse()
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid listen address: {}", e)))?;

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    service_core::axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn build_service_registry(config: &SsoConfig) -> Result<Arc<dyn ServiceRegistry>, AppError> {
    let registry: Arc<dyn ServiceRegistry> = match config.registry.backend {
        RegistryBackend::Memory => Arc::new(InMemoryServiceRegistry::default()),
        RegistryBackend::Json => {
            let path = config.registry.json_path.clone().ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!("SERVICE_REGISTRY_JSON_PATH is not set"))
            })?;
            Arc::new(JsonServiceRegistry::new(path))
        }
        RegistryBackend::Redis => {
            let redis = config.redis.as_ref().ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!("REDIS_URL is not set"))
            })?;
            let registry =
                RedisServiceRegistry::new(redis, config.registry.redis_scan_count).await?;
            registry.health_check().await?;
            Arc::new(registry)
        }
    };
    tracing::info!(registry = registry.name(), "Service registry initialized");
    Ok(registry)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
