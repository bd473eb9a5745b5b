//! Ticket registry and the read-only view the SSO decision consumes.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::error::TicketError;
use crate::models::{Authentication, TicketGrantingTicket};

#[async_trait]
pub trait TicketRegistry: Send + Sync {
    async fn add_ticket(&self, ticket: TicketGrantingTicket) -> Result<(), TicketError>;

    async fn get_ticket(&self, ticket_id: &str) -> Result<Option<TicketGrantingTicket>, TicketError>;

    async fn update_ticket(&self, ticket: TicketGrantingTicket) -> Result<(), TicketError>;

    async fn delete_ticket(&self, ticket_id: &str) -> Result<bool, TicketError>;

    async fn tickets_count(&self) -> Result<usize, TicketError>;
}

/// In-memory ticket registry.
#[derive(Clone, Default)]
pub struct DefaultTicketRegistry {
    tickets: Arc<DashMap<String, TicketGrantingTicket>>,
}

impl DefaultTicketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every expired ticket, returning how many were dropped.
    pub fn clean_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.tickets.len();
        self.tickets.retain(|_, ticket| !ticket.is_expired(now));
        let removed = before.saturating_sub(self.tickets.len());
        if removed > 0 {
            tracing::info!(removed, "Removed expired ticket-granting tickets");
        }
        removed
    }

    pub fn spawn_cleaner(&self, interval: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                registry.clean_expired();
            }
        })
    }
}

#[async_trait]
impl TicketRegistry for DefaultTicketRegistry {
    async fn add_ticket(&self, ticket: TicketGrantingTicket) -> Result<(), TicketError> {
        self.tickets.insert(ticket.id.clone(), ticket);
        Ok(())
    }

    async fn get_ticket(&self, ticket_id: &str) -> Result<Option<TicketGrantingTicket>, TicketError> {
        Ok(self.tickets.get(ticket_id).map(|t| t.value().clone()))
    }

    async fn update_ticket(&self, ticket: TicketGrantingTicket) -> Result<(), TicketError> {
        match self.tickets.get_mut(&ticket.id) {
            Some(mut existing) => {
                *existing = ticket;
                Ok(())
            }
            None => Err(TicketError::NotFound(ticket.id)),
        }
    }

    async fn delete_ticket(&self, ticket_id: &str) -> Result<bool, TicketError> {
        Ok(self.tickets.remove(ticket_id).is_some())
    }

    async fn tickets_count(&self) -> Result<usize, TicketError> {
        Ok(self.tickets.len())
    }
}

/// Read-only accessor over a ticket registry.
#[derive(Clone)]
pub struct TicketRegistrySupport {
    registry: Arc<dyn TicketRegistry>,
}

impl TicketRegistrySupport {
    pub fn new(registry: Arc<dyn TicketRegistry>) -> Self {
        Self { registry }
    }

    /// Authentication record of a live ticket-granting ticket.
    ///
    /// Missing, expired and unreadable tickets all come back as `None`.
    pub async fn authentication_from(&self, ticket_id: &str) -> Option<Authentication> {
        let ticket = match self.registry.get_ticket(ticket_id).await {
            Ok(Some(ticket)) => ticket,
            Ok(None) => {
                tracing::debug!(ticket_id = %ticket_id, "Ticket-granting ticket not found");
                return None;
            }
            Err(e) => {
                tracing::warn!(ticket_id = %ticket_id, error = %e, "Failed to read ticket-granting ticket");
                return None;
            }
        };

        if ticket.is_expired(Utc::now()) {
            tracing::debug!(ticket_id = %ticket_id, "Ticket-granting ticket is expired");
            return None;
        }

        Some(ticket.authentication)
    }
}
