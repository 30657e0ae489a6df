//! Error types for the linker
//!
//! Recoverable model problems are reported as diagnostics; everything here
//! aborts the run.

use thiserror::Error;

/// Result type for linker operations
pub type Result<T> = std::result::Result<T, LinkError>;

/// Fatal linker errors
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("{diminisher}: Fatal Error: {message}")]
    DiminisherFatal { diminisher: String, message: String },

    #[error("unexpected cycle detected at {path}")]
    UnexpectedCycle { path: String },

    #[error("internal invariant violated in {stage}: {message}")]
    InvariantViolation { stage: &'static str, message: String },

    #[error("stage '{stage}' reads {field} before any earlier stage writes it")]
    PassOrder { stage: &'static str, field: &'static str },

    #[error("Namespace already exists: {0}")]
    DuplicateNamespace(String),

    #[error("Unknown namespace: {0}")]
    UnknownNamespace(String),

    #[error("Namespace '{namespace}' depends on unknown namespace '{dependency}'")]
    UnknownDependency { namespace: String, dependency: String },

    #[error("Namespace dependency cycle involving '{0}'")]
    DependencyCycle(String),

    #[error("{kind} '{name}' is declared more than once in namespace '{namespace}'")]
    DuplicateEntity { kind: String, name: String, namespace: String },

    #[error("Invalid data standard version: {0}")]
    InvalidVersion(String),

    #[error("Linking failed with {0} error(s)")]
    ValidationFailed(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Semver error: {0}")]
    Semver(#[from] semver::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl LinkError {
    /// Build the fatal error a hardcoded diminisher raises.
    pub fn diminisher(diminisher: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DiminisherFatal {
            diminisher: diminisher.into(),
            message: message.into(),
        }
    }
}
