//! Resolution of the request's service into the service that policy applies to.

use std::sync::Arc;

use crate::models::Service;

/// One way of turning a request's service into the effective service.
pub trait AuthenticationServiceSelectionStrategy: Send + Sync {
    /// `None` when this strategy does not apply to `service`.
    fn resolve(&self, service: &Service) -> Option<Service>;

    /// Lower values are tried first.
    fn order(&self) -> i32 {
        0
    }
}

/// Fallback that keeps the service as-is. Always applies, always last.
#[derive(Debug, Clone, Default)]
pub struct DefaultAuthenticationServiceSelectionStrategy;

impl AuthenticationServiceSelectionStrategy for DefaultAuthenticationServiceSelectionStrategy {
    fn resolve(&self, service: &Service) -> Option<Service> {
        Some(service.clone())
    }

    fn order(&self) -> i32 {
        i32::MAX
    }
}

/// Unwraps protocol callback urls of the form `{prefix}?service=<target>`
/// to the target application they delegate to.
#[derive(Debug, Clone)]
pub struct CallbackUrlServiceSelectionStrategy {
    callback_prefix: String,
    parameter: String,
}

impl CallbackUrlServiceSelectionStrategy {
    pub fn new(callback_prefix: impl Into<String>) -> Self {
        Self {
            callback_prefix: callback_prefix.into(),
            parameter: "service".to_string(),
        }
    }

    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = parameter.into();
        self
    }
}

impl AuthenticationServiceSelectionStrategy for CallbackUrlServiceSelectionStrategy {
    fn resolve(&self, service: &Service) -> Option<Service> {
        if !service.id.starts_with(&self.callback_prefix) {
            return None;
        }
        let (_, query) = service.id.split_once('?')?;
        let params: Vec<(String, String)> = serde_urlencoded::from_str(query).ok()?;
        let target = params
            .into_iter()
            .find(|(k, v)| k == &self.parameter && !v.is_empty())
            .map(|(_, v)| v)?;

        tracing::debug!(callback = %service.id, target = %target, "Resolved service from callback url");
        Some(Service::resolved_from(service, target))
    }

    fn order(&self) -> i32 {
        0
    }
}

/// Ordered chain of selection strategies; the first answer wins.
#[derive(Clone)]
pub struct AuthenticationServiceSelectionPlan {
    strategies: Vec<Arc<dyn AuthenticationServiceSelectionStrategy>>,
}

impl Default for AuthenticationServiceSelectionPlan {
    fn default() -> Self {
        Self::new(vec![Arc::new(DefaultAuthenticationServiceSelectionStrategy)])
    }
}

impl AuthenticationServiceSelectionPlan {
    pub fn new(strategies: Vec<Arc<dyn AuthenticationServiceSelectionStrategy>>) -> Self {
        let mut plan = Self {
            strategies: Vec::new(),
        };
        for strategy in strategies {
            plan.register_strategy(strategy);
        }
        plan
    }

    /// Add a strategy, keeping the chain sorted by `order()`. Strategies with
    /// equal order keep their registration order.
    pub fn register_strategy(&mut self, strategy: Arc<dyn AuthenticationServiceSelectionStrategy>) {
        self.strategies.push(strategy);
        self.strategies.sort_by_key(|s| s.order());
    }

    pub fn resolve_service(&self, service: Option<&Service>) -> Option<Service> {
        let service = service?;
        self.strategies.iter().find_map(|s| s.resolve(service))
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
