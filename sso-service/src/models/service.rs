use serde::{Deserialize, Serialize};

/// Service reference carried by an authentication request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub original_url: String,
}

impl Service {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            original_url: id.clone(),
            id,
        }
    }

    /// A service resolved from `original` that now points at `id`.
    pub fn resolved_from(original: &Service, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            original_url: original.original_url.clone(),
        }
    }
}
