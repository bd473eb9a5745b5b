use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

use crate::models::RegisteredService;
use crate::AppState;

/// Reload registered services from the backing registry.
pub async fn reload_services(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let loaded = state.services_manager.load().await?;
    tracing::info!(loaded, "Registered services reloaded by admin request");
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "loaded": loaded })),
    ))
}

/// List the services currently cached, in evaluation order.
pub async fn list_services(State(state): State<AppState>) -> Json<Vec<RegisteredService>> {
    let services = state.services_manager.all_services();
    for service in services.iter() {
        tracing::debug!(
            id = service.id,
            pattern = service.service_id.as_str(),
            evaluation_order = service.evaluation_order,
            "Listing registered service"
        );
    }
    Json(services.iter().map(|s| s.as_ref().clone()).collect())
}
