use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid service pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum TicketError {
    #[error("Ticket registry unavailable: {0}")]
    Unavailable(String),

    #[error("Ticket not found: {0}")]
    NotFound(String),
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Redis(e) => AppError::RedisError(e),
            RegistryError::InvalidPattern { .. } => AppError::BadRequest(anyhow::anyhow!(err)),
            RegistryError::Serialization(e) => AppError::InternalError(anyhow::anyhow!(e)),
            RegistryError::Io(e) => AppError::ServiceUnavailable(anyhow::anyhow!(e)),
            RegistryError::Internal(e) => AppError::InternalError(e),
        }
    }
}

impl From<TicketError> for AppError {
    fn from(err: TicketError) -> Self {
        match err {
            TicketError::Unavailable(e) => AppError::ServiceUnavailable(anyhow::anyhow!(e)),
            TicketError::NotFound(id) => {
                AppError::NotFound(anyhow::anyhow!("Ticket not found: {}", id))
            }
        }
    }
}
