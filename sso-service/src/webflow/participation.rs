//! Decides whether an existing SSO session may be reused for a request.

use async_trait::async_trait;
use std::sync::Arc;

use super::context::RequestContext;
use crate::services::{AuthenticationServiceSelectionPlan, ServicesManager, TicketRegistrySupport};

#[async_trait]
pub trait SingleSignOnParticipationStrategy: Send + Sync {
    /// Whether this strategy has anything to say about the request.
    fn supports(&self, context: &RequestContext) -> bool;

    /// Whether the existing session may be reused without a credential prompt.
    async fn is_participating(&self, context: &RequestContext) -> bool;

    /// Position within a chain; lower runs first.
    fn order(&self) -> i32 {
        0
    }
}

/// Global switch plus the `renew` request flag.
#[derive(Debug, Clone)]
pub struct DefaultSingleSignOnParticipationStrategy {
    sso_enabled: bool,
}

impl DefaultSingleSignOnParticipationStrategy {
    pub fn new(sso_enabled: bool) -> Self {
        Self { sso_enabled }
    }
}

#[async_trait]
impl SingleSignOnParticipationStrategy for DefaultSingleSignOnParticipationStrategy {
    fn supports(&self, _context: &RequestContext) -> bool {
        true
    }

    async fn is_participating(&self, context: &RequestContext) -> bool {
        self.sso_enabled && !context.is_renew()
    }

    fn order(&self) -> i32 {
        i32::MAX
    }
}

/// Allows SSO only when the session was established by every authentication
/// handler the matched service requires.
///
/// Nothing to check (no service, no ticket id, no matching service, no
/// policy) permits SSO. A ticket id that cannot be resolved to a live
/// session forces re-authentication.
#[derive(Clone)]
pub struct RequiredAuthenticationHandlersParticipationStrategy {
    services_manager: ServicesManager,
    selection_plan: AuthenticationServiceSelectionPlan,
    ticket_registry_support: TicketRegistrySupport,
}

impl RequiredAuthenticationHandlersParticipationStrategy {
    pub fn new(
        services_manager: ServicesManager,
        selection_plan: AuthenticationServiceSelectionPlan,
        ticket_registry_support: TicketRegistrySupport,
    ) -> Self {
        Self {
            services_manager,
            selection_plan,
            ticket_registry_support,
        }
    }
}

#[async_trait]
impl SingleSignOnParticipationStrategy for RequiredAuthenticationHandlersParticipationStrategy {
    fn supports(&self, context: &RequestContext) -> bool {
        context.service().is_some() && context.ticket_granting_ticket_id().is_some()
    }

    async fn is_participating(&self, context: &RequestContext) -> bool {
        let (Some(service), Some(ticket_id)) =
            (context.service(), context.ticket_granting_ticket_id())
        else {
            return true;
        };

        let Some(resolved) = self.selection_plan.resolve_service(Some(service)) else {
            return true;
        };

        let Some(registered_service) = self.services_manager.find_service_by(&resolved.id) else {
            tracing::debug!(service = %resolved.id, "No registered service matches; allowing SSO");
            return true;
        };

        let policy = match &registered_service.authentication_policy {
            Some(policy) if !policy.is_unrestricted() => policy,
            _ => return true,
        };

        let Some(authentication) = self
            .ticket_registry_support
            .authentication_from(ticket_id)
            .await
        else {
            tracing::debug!(
                service = %resolved.id,
                ticket_id = %ticket_id,
                "No live authentication for ticket; SSO denied"
            );
            return false;
        };

        let participating = policy.is_satisfied_by(authentication.success_handler_names());
        tracing::debug!(
            service = %resolved.id,
            registered_service_id = registered_service.id,
            required = ?policy.required_authentication_handlers,
            actual = ?authentication.success_handler_names(),
            participating,
            "Evaluated required authentication handlers"
        );
        participating
    }

    fn order(&self) -> i32 {
        0
    }
}

/// Runs every supporting strategy; SSO proceeds only if all of them agree.
#[derive(Clone, Default)]
pub struct ChainingSingleSignOnParticipationStrategy {
    strategies: Vec<Arc<dyn SingleSignOnParticipationStrategy>>,
}

impl ChainingSingleSignOnParticipationStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Equal orders keep registration order.
    pub fn add_strategy(&mut self, strategy: Arc<dyn SingleSignOnParticipationStrategy>) {
        self.strategies.push(strategy);
        self.strategies.sort_by_key(|s| s.order());
    }

    pub fn with_strategy(mut self, strategy: Arc<dyn SingleSignOnParticipationStrategy>) -> Self {
        self.add_strategy(strategy);
        self
    }
}

#[async_trait]
impl SingleSignOnParticipationStrategy for ChainingSingleSignOnParticipationStrategy {
    fn supports(&self, context: &RequestContext) -> bool {
        self.strategies.iter().any(|s| s.supports(context))
    }

    async fn is_participating(&self, context: &RequestContext) -> bool {
        for strategy in self.strategies.iter().filter(|s| s.supports(context)) {
            if !strategy.is_participating(context).await {
                return false;
            }
        }
        true
    }
}
