//! Environment configuration surface
//!
//! The harness reads the same knobs CI sets for it: the base URL of the site
//! under test, the CI flag (retry count, worker count, whether a local dev
//! server is auto-started) and the optional admin credential pair that gates
//! the admin audit group.

use std::env;

/// Admin credential pair. Absence skips the admin audit group, it never
/// fails it.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub user: String,
    pub password: String,
}

/// Resolved harness configuration.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Base URL of the site under test.
    pub base_url: String,

    /// Running under CI.
    pub ci: bool,

    /// Full-target retries on failure.
    pub retries: u32,

    /// Concurrent audit workers, each owning its own browser process.
    pub workers: usize,

    /// Credentials enabling the admin audit group.
    pub admin: Option<AdminCredentials>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            ci: false,
            retries: 0,
            workers: 4,
            admin: None,
        }
    }
}

impl HarnessConfig {
    /// Build the configuration from the process environment: `BASE_URL`,
    /// `CI`, `ADMIN_USER`/`ADMIN_PASS`.
    pub fn from_env() -> Self {
        let ci = env::var("CI").map(|v| !v.is_empty() && v != "0").unwrap_or(false);

        let admin = match (env::var("ADMIN_USER"), env::var("ADMIN_PASS")) {
            (Ok(user), Ok(password)) if !user.is_empty() && !password.is_empty() => {
                Some(AdminCredentials { user, password })
            }
            _ => None,
        };

        Self {
            base_url: env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            ci,
            retries: if ci { 2 } else { 0 },
            workers: if ci { 2 } else { 4 },
            admin,
        }
    }

    /// Whether a local dev server should be auto-started. CI environments
    /// provide their own site; locally the harness may spawn one.
    pub fn auto_start_server(&self) -> bool {
        !self.ci
    }
}
