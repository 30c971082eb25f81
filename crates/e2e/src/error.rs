//! Error types for the audit harness

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    /// The rule engine could not be loaded into the page. Fatal for the
    /// target: compliance cannot be asserted without it.
    #[error("rule engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("audit script failed during {stage}: {reason}")]
    Script { stage: String, reason: String },

    #[error("timed out after {ms} ms: {operation}")]
    Timeout { operation: String, ms: u64 },

    #[error("Playwright not found. Install with: npm install && npx playwright install")]
    PlaywrightNotFound,

    #[error("server failed to start: {0}")]
    ServerStartup(String),

    #[error("server health check failed after {0} attempts")]
    ServerHealthCheck(usize),

    #[error("target manifest error: {0}")]
    Manifest(String),

    #[error(transparent)]
    Audit(#[from] siteaudit_core::AuditError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type HarnessResult<T> = Result<T, HarnessError>;
