//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent malformed input or documents.
/// These are independent of transport concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid build parameters: {0}")]
    InvalidParams(String),

    #[error("unsupported value for build parameter '{name}': expected string, number or boolean")]
    UnsupportedParamValue { name: String },

    #[error("malformed job configuration: {0}")]
    MalformedConfig(String),

    #[error("invalid job path: {0}")]
    InvalidJobPath(String),
}
