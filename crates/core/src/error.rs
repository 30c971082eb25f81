//! Error types for the audit core

use thiserror::Error;

/// Result type alias using the core audit error
pub type Result<T> = std::result::Result<T, AuditError>;

#[derive(Error, Debug)]
pub enum AuditError {
    /// One or more non-allow-listed rule violations. The message enumerates
    /// every offending rule with its matched targets.
    #[error("accessibility violations found:\n{0}")]
    Compliance(String),

    /// A structural predicate failed for specific elements.
    #[error("structural check '{check}' failed:\n{details}")]
    StructuralCheck { check: String, details: String },

    /// Scan or snapshot payload could not be decoded.
    #[error("malformed scan payload: {0}")]
    Decode(#[from] serde_json::Error),
}
