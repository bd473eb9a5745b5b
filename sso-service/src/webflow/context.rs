//! Request-scoped state shared between upstream resolution steps and the
//! SSO participation decision.

use std::collections::HashMap;

use crate::models::Service;

pub const SERVICE_KEY: &str = "service";
pub const TICKET_GRANTING_TICKET_ID_KEY: &str = "ticketGrantingTicketId";
pub const RENEW_KEY: &str = "renew";

#[derive(Debug, Clone, PartialEq)]
pub enum ScopeValue {
    Service(Service),
    Text(String),
    Flag(bool),
}

/// Key/value store living for one request.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    values: HashMap<String, ScopeValue>,
}

impl Scope {
    pub fn put(&mut self, key: impl Into<String>, value: ScopeValue) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&ScopeValue> {
        self.values.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ScopeValue> {
        self.values.remove(key)
    }

    fn text(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(ScopeValue::Text(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Flow and request scopes of one authentication request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub flow_scope: Scope,
    pub request_scope: Scope,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_service_into_flow_scope(&mut self, service: Service) {
        self.flow_scope.put(SERVICE_KEY, ScopeValue::Service(service));
    }

    pub fn service(&self) -> Option<&Service> {
        match self.flow_scope.get(SERVICE_KEY) {
            Some(ScopeValue::Service(service)) => Some(service),
            _ => None,
        }
    }

    /// Store the ticket-granting ticket id in both request and flow scope.
    pub fn put_ticket_granting_ticket_in_scopes(&mut self, ticket_id: impl Into<String>) {
        let ticket_id = ticket_id.into();
        self.request_scope.put(
            TICKET_GRANTING_TICKET_ID_KEY,
            ScopeValue::Text(ticket_id.clone()),
        );
        self.flow_scope
            .put(TICKET_GRANTING_TICKET_ID_KEY, ScopeValue::Text(ticket_id));
    }

    /// Request scope takes precedence over flow scope.
    pub fn ticket_granting_ticket_id(&self) -> Option<&str> {
        self.request_scope
            .text(TICKET_GRANTING_TICKET_ID_KEY)
            .or_else(|| self.flow_scope.text(TICKET_GRANTING_TICKET_ID_KEY))
    }

    pub fn put_renew(&mut self, renew: bool) {
        self.request_scope.put(RENEW_KEY, ScopeValue::Flag(renew));
    }

    pub fn is_renew(&self) -> bool {
        matches!(self.request_scope.get(RENEW_KEY), Some(ScopeValue::Flag(true)))
    }
}
