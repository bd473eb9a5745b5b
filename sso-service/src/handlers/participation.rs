use serde::{Deserialize, Serialize};
use service_core::axum::{extract::State, Json};

use crate::models::Service;
use crate::webflow::RequestContext;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ParticipationRequest {
    pub service: Option<String>,
    pub ticket_granting_ticket: Option<String>,
    #[serde(default)]
    pub renew: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ParticipationResponse {
    pub supported: bool,
    pub participating: bool,
}

impl ParticipationRequest {
    fn into_context(self) -> RequestContext {
        let mut context = RequestContext::new();
        if let Some(service) = self.service.filter(|s| !s.is_empty()) {
            context.put_service_into_flow_scope(Service::new(service));
        }
        if let Some(ticket_id) = self.ticket_granting_ticket {
            context.put_ticket_granting_ticket_in_scopes(ticket_id);
        }
        context.put_renew(self.renew);
        context
    }
}

/// Decide whether the caller's SSO session may be reused for a service.
pub async fn evaluate(
    State(state): State<AppState>,
    Json(req): Json<ParticipationRequest>,
) -> Json<ParticipationResponse> {
    let context = req.into_context();
    let supported = state.participation.supports(&context);
    let participating = state.participation.is_participating(&context).await;

    tracing::info!(
        service = context.service().map(|s| s.id.as_str()).unwrap_or("-"),
        supported,
        participating,
        "SSO participation evaluated"
    );

    Json(ParticipationResponse {
        supported,
        participating,
    })
}
