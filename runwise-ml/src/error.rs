//! Error types for the runwise-ml crate.

use thiserror::Error;

/// Top-level error type for registry, metric and resolver operations.
///
/// Early termination of a training loop is deliberately not represented here;
/// see [`crate::training::control::TerminateExecution`].
#[derive(Debug, Error)]
pub enum MlError {
    /// Malformed or ambiguous user configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A resolved or supplied object does not provide the required capability.
    #[error("Type error: {0}")]
    Type(String),

    /// Lookup in a fixed table (e.g. the color palette) failed.
    #[error("Lookup error: {0}")]
    Lookup(String),

    /// A registered constructor rejected its arguments.
    #[error("Construction error: {0}")]
    Construction(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config loading error: {0}")]
    Figment(#[from] Box<figment::Error>),
}

impl MlError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::Type(msg.into())
    }

    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }

    pub fn construction(msg: impl Into<String>) -> Self {
        Self::Construction(msg.into())
    }

    /// Whether this error belongs to the configuration kind.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Whether this error belongs to the capability/type kind.
    pub fn is_type(&self) -> bool {
        matches!(self, Self::Type(_))
    }
}
