//! Ticket-granting ticket and the authentication record it owns.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

pub const TICKET_GRANTING_TICKET_PREFIX: &str = "TGT";

/// Outcome of the initial login (and any later step-up) for one SSO session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authentication {
    pub principal: String,
    pub authentication_date: DateTime<Utc>,
    pub successes: BTreeSet<String>,
}

impl Authentication {
    pub fn new(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            authentication_date: Utc::now(),
            successes: BTreeSet::new(),
        }
    }

    pub fn with_success(mut self, handler_name: impl Into<String>) -> Self {
        self.add_success(handler_name);
        self
    }

    /// Record a handler that validated credentials. The set only grows.
    pub fn add_success(&mut self, handler_name: impl Into<String>) {
        self.successes.insert(handler_name.into());
    }

    pub fn success_handler_names(&self) -> &BTreeSet<String> {
        &self.successes
    }
}

/// Hard and idle timeouts for a ticket-granting ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirationPolicy {
    pub max_time_to_live_seconds: i64,
    pub time_to_kill_seconds: i64,
}

impl Default for ExpirationPolicy {
    fn default() -> Self {
        Self {
            max_time_to_live_seconds: 8 * 60 * 60,
            time_to_kill_seconds: 2 * 60 * 60,
        }
    }
}

/// Live SSO session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketGrantingTicket {
    pub id: String,
    pub authentication: Authentication,
    pub creation_time: DateTime<Utc>,
    pub last_time_used: DateTime<Utc>,
    pub expired: bool,
    pub expiration_policy: ExpirationPolicy,
}

impl TicketGrantingTicket {
    pub fn new(authentication: Authentication, expiration_policy: ExpirationPolicy) -> Self {
        let now = Utc::now();
        Self {
            id: Self::generate_id(),
            authentication,
            creation_time: now,
            last_time_used: now,
            expired: false,
            expiration_policy,
        }
    }

    pub fn generate_id() -> String {
        format!(
            "{}-{}",
            TICKET_GRANTING_TICKET_PREFIX,
            Uuid::new_v4().simple()
        )
    }

    /// Explicit invalidation (logout).
    pub fn mark_expired(&mut self) {
        self.expired = true;
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        if self.expired {
            return true;
        }
        let max_lifetime = Duration::seconds(self.expiration_policy.max_time_to_live_seconds);
        let idle_limit = Duration::seconds(self.expiration_policy.time_to_kill_seconds);
        now - self.creation_time >= max_lifetime || now - self.last_time_used >= idle_limit
    }
}
