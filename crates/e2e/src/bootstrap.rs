//! Suite bootstrap and teardown
//!
//! One-shot pre-flight before the suite runs: an HTTP reachability probe and
//! a readiness check for the target's client runtime. Both are advisory —
//! a failure here is logged and never propagates to a test failure. Teardown
//! is best-effort scratch cleanup.

use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};

use crate::playwright::{BridgeConfig, PlaywrightBridge};

/// Pre-flight connectivity and readiness check. Never fails the suite.
pub async fn global_setup(base_url: &str, readiness_global: &str) {
    info!("Checking target site at {}", base_url);

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            warn!("Could not build HTTP client for pre-flight check: {}", e);
            return;
        }
    };

    match client.get(base_url).send().await {
        Ok(resp) if resp.status().is_success() => {
            info!("Target site is reachable ({})", resp.status());
        }
        Ok(resp) => {
            warn!("Target site answered {} - proceeding anyway", resp.status());
        }
        Err(e) => {
            warn!("Target site unreachable: {} - proceeding anyway", e);
            return;
        }
    }

    let bridge = match PlaywrightBridge::new(BridgeConfig {
        base_url: base_url.to_string(),
        screenshot_dir: std::env::temp_dir(),
        ..Default::default()
    }) {
        Ok(bridge) => bridge,
        Err(e) => {
            warn!("Readiness probe unavailable: {}", e);
            return;
        }
    };

    match bridge.probe_readiness(readiness_global).await {
        Ok(true) => info!("Client runtime is initialized (window.{} present)", readiness_global),
        Ok(false) => warn!(
            "Client runtime marker window.{} not found - proceeding with audits",
            readiness_global
        ),
        Err(e) => warn!("Readiness probe failed: {} - proceeding with audits", e),
    }
}

/// Best-effort cleanup after the suite. A no-op when there is nothing to do.
pub fn global_teardown(output_dir: &Path) {
    let scratch = output_dir.join(".scratch");
    if scratch.exists() {
        if let Err(e) = std::fs::remove_dir_all(&scratch) {
            warn!("Could not remove scratch dir {}: {}", scratch.display(), e);
        }
    }
    info!("Suite teardown completed");
}
