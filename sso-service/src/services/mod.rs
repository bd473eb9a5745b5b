//! Services layer for sso-service.
//!
//! Registered service storage and caching, service selection, and ticket
//! lookups backing the SSO participation decision.

pub mod error;
pub mod registry;
mod selection;
mod services_manager;
mod tickets;

pub use error::{RegistryError, TicketError};
pub use registry::{
    InMemoryServiceRegistry, JsonServiceRegistry, RedisServiceRegistry, ServiceRegistry,
};
pub use selection::{
    AuthenticationServiceSelectionPlan, AuthenticationServiceSelectionStrategy,
    CallbackUrlServiceSelectionStrategy, DefaultAuthenticationServiceSelectionStrategy,
};
pub use services_manager::ServicesManager;
pub use tickets::{DefaultTicketRegistry, TicketRegistry, TicketRegistrySupport};
