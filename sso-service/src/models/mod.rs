//! Domain models for the SSO participation service.

pub mod registered_service;
pub mod service;
pub mod ticket;

pub use registered_service::{AuthenticationPolicy, RegisteredService, ServicePattern};
pub use service::Service;
pub use ticket::{Authentication, ExpirationPolicy, TicketGrantingTicket};
