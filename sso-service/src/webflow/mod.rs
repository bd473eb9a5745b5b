//! Request-flow pieces: scoped request state and SSO participation strategies.

pub mod context;
pub mod participation;

pub use context::{RequestContext, Scope, ScopeValue};
pub use participation::{
    ChainingSingleSignOnParticipationStrategy, DefaultSingleSignOnParticipationStrategy,
    RequiredAuthenticationHandlersParticipationStrategy, SingleSignOnParticipationStrategy,
};
