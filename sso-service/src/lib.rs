pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod webflow;

use service_core::axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::tracing::request_id_middleware;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::SsoConfig;
use crate::services::{
    AuthenticationServiceSelectionPlan, AuthenticationServiceSelectionStrategy,
    CallbackUrlServiceSelectionStrategy, DefaultAuthenticationServiceSelectionStrategy,
    ServicesManager, TicketRegistry, TicketRegistrySupport,
};
use crate::webflow::{
    ChainingSingleSignOnParticipationStrategy, DefaultSingleSignOnParticipationStrategy,
    RequiredAuthenticationHandlersParticipationStrategy, SingleSignOnParticipationStrategy,
};

#[derive(Clone)]
pub struct AppState {
    pub config: SsoConfig,
    pub services_manager: ServicesManager,
    pub ticket_registry: Arc<dyn TicketRegistry>,
    pub participation: Arc<dyn SingleSignOnParticipationStrategy>,
}

impl AppState {
    /// Wire the participation chain around an already constructed services
    /// manager and ticket registry.
    pub fn new(
        config: SsoConfig,
        services_manager: ServicesManager,
        ticket_registry: Arc<dyn TicketRegistry>,
    ) -> Self {
        let selection_plan = build_selection_plan(&config);
        let required_handlers = RequiredAuthenticationHandlersParticipationStrategy::new(
            services_manager.clone(),
            selection_plan,
            TicketRegistrySupport::new(ticket_registry.clone()),
        );
        let participation = ChainingSingleSignOnParticipationStrategy::new()
            .with_strategy(Arc::new(DefaultSingleSignOnParticipationStrategy::new(
                config.sso.enabled,
            )))
            .with_strategy(Arc::new(required_handlers));

        Self {
            config,
            services_manager,
            ticket_registry,
            participation: Arc::new(participation),
        }
    }
}

pub fn build_selection_plan(config: &SsoConfig) -> AuthenticationServiceSelectionPlan {
    let mut strategies: Vec<Arc<dyn AuthenticationServiceSelectionStrategy>> =
        vec![Arc::new(DefaultAuthenticationServiceSelectionStrategy)];
    if let Some(prefix) = &config.sso.callback_url_prefix {
        strategies.push(Arc::new(CallbackUrlServiceSelectionStrategy::new(
            prefix.clone(),
        )));
    }
    AuthenticationServiceSelectionPlan::new(strategies)
}

pub fn build_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route(
            "/admin/services",
            get(handlers::admin::list_services),
        )
        .route(
            "/admin/services/reload",
            post(handlers::admin::reload_services),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::admin_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/sso/participation", post(handlers::participation::evaluate))
        .merge(admin_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
}

/// Service health check
pub async fn health_check(
    service_core::axum::extract::State(state): service_core::axum::extract::State<AppState>,
) -> Result<service_core::axum::Json<serde_json::Value>, AppError> {
    let tickets = state.ticket_registry.tickets_count().await.map_err(|e| {
        tracing::error!(error = %e, "Ticket registry health check failed");
        AppError::from(e)
    })?;

    Ok(service_core::axum::Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "service_registry": state.services_manager.registry().name(),
            "registered_services": state.services_manager.count(),
            "ticket_granting_tickets": tickets,
        }
    })))
}
