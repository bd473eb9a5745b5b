//! Registered service model - downstream applications allowed to rely on SSO.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::services::error::RegistryError;

/// Identifier pattern a registered service answers to.
///
/// Patterns are compiled when the service is built or deserialized, so an
/// invalid expression is rejected up front instead of failing a lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "PatternDef", into = "PatternDef")]
pub enum ServicePattern {
    /// Byte-for-byte identifier comparison.
    Exact(String),
    /// `*` matches any run of characters, `?` exactly one.
    Glob { source: String, compiled: Regex },
    /// Regular expression that must match the whole identifier.
    Regex { source: String, compiled: Regex },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "pattern", rename_all = "lowercase")]
enum PatternDef {
    Exact(String),
    Glob(String),
    Regex(String),
}

impl ServicePattern {
    pub fn exact(identifier: impl Into<String>) -> Self {
        ServicePattern::Exact(identifier.into())
    }

    pub fn glob(glob: impl Into<String>) -> Result<Self, RegistryError> {
        let source = glob.into();
        let translated: String = source
            .chars()
            .map(|c| match c {
                '*' => ".*".to_string(),
                '?' => ".".to_string(),
                other => regex::escape(&other.to_string()),
            })
            .collect();
        let compiled = compile_anchored(&source, &translated)?;
        Ok(ServicePattern::Glob { source, compiled })
    }

    pub fn regex(expression: impl Into<String>) -> Result<Self, RegistryError> {
        let source = expression.into();
        let compiled = compile_anchored(&source, &source)?;
        Ok(ServicePattern::Regex { source, compiled })
    }

    /// The pattern as it was configured.
    pub fn as_str(&self) -> &str {
        match self {
            ServicePattern::Exact(source) => source,
            ServicePattern::Glob { source, .. } | ServicePattern::Regex { source, .. } => source,
        }
    }

    pub fn matches(&self, identifier: &str) -> bool {
        match self {
            ServicePattern::Exact(source) => source == identifier,
            ServicePattern::Glob { compiled, .. } | ServicePattern::Regex { compiled, .. } => {
                compiled.is_match(identifier)
            }
        }
    }
}

fn compile_anchored(source: &str, expression: &str) -> Result<Regex, RegistryError> {
    Regex::new(&format!("^(?:{})$", expression)).map_err(|e| RegistryError::InvalidPattern {
        pattern: source.to_string(),
        source: e,
    })
}

impl TryFrom<PatternDef> for ServicePattern {
    type Error = RegistryError;

    fn try_from(def: PatternDef) -> Result<Self, Self::Error> {
        match def {
            PatternDef::Exact(s) => Ok(ServicePattern::exact(s)),
            PatternDef::Glob(s) => ServicePattern::glob(s),
            PatternDef::Regex(s) => ServicePattern::regex(s),
        }
    }
}

impl From<ServicePattern> for PatternDef {
    fn from(pattern: ServicePattern) -> Self {
        match pattern {
            ServicePattern::Exact(s) => PatternDef::Exact(s),
            ServicePattern::Glob { source, .. } => PatternDef::Glob(source),
            ServicePattern::Regex { source, .. } => PatternDef::Regex(source),
        }
    }
}

/// Per-service rules on how a session must have been authenticated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationPolicy {
    #[serde(default)]
    pub required_authentication_handlers: BTreeSet<String>,
}

impl AuthenticationPolicy {
    pub fn requiring<I, S>(handlers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required_authentication_handlers: handlers.into_iter().map(Into::into).collect(),
        }
    }

    /// True when the policy places no constraint on the session.
    pub fn is_unrestricted(&self) -> bool {
        self.required_authentication_handlers.is_empty()
    }

    /// Every required handler must appear among the session's successes.
    pub fn is_satisfied_by(&self, successful_handlers: &BTreeSet<String>) -> bool {
        self.required_authentication_handlers
            .is_subset(successful_handlers)
    }
}

/// Registered service entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredService {
    pub id: i64,
    pub name: String,
    pub service_id: ServicePattern,
    #[serde(default)]
    pub evaluation_order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_policy: Option<AuthenticationPolicy>,
}

impl RegisteredService {
    pub fn new(id: i64, name: impl Into<String>, service_id: ServicePattern) -> Self {
        Self {
            id,
            name: name.into(),
            service_id,
            evaluation_order: 0,
            authentication_policy: None,
        }
    }

    pub fn with_authentication_policy(mut self, policy: AuthenticationPolicy) -> Self {
        self.authentication_policy = Some(policy);
        self
    }

    pub fn with_evaluation_order(mut self, order: i32) -> Self {
        self.evaluation_order = order;
        self
    }

    /// Check whether this service answers to the given identifier.
    pub fn matches(&self, identifier: &str) -> bool {
        !identifier.is_empty() && self.service_id.matches(identifier)
    }
}
