//! Audit runner
//!
//! Orchestrates the suite: enumerates page targets, drives each one through
//! navigate -> scan -> report -> structural checks -> compliance assertion,
//! and aggregates per-target outcomes. Targets are isolated: workers run in
//! parallel, each attempt gets a fresh browser session, and one target's
//! failure never aborts the others.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use siteaudit_core::checks::{ensure_all_passed, run_structural_checks, CheckResult};
use siteaudit_core::{Report, ScanOptions};

use crate::bootstrap;
use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::playwright::{AuditJob, BridgeConfig, LoginStep, PlaywrightBridge};
use crate::reporter;
use crate::server::{ServerConfig, ServerHandle};
use crate::targets::{enumerate_all, PageTarget, TargetManifest};

/// Rules exempted on admin-interface targets on top of per-page allows.
/// Admin layouts legitimately nest multiple regions and main landmarks.
const ADMIN_ALLOW: &[&str] = &["region", "landmark-one-main"];

/// Outcome of auditing a single page target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetResult {
    pub name: String,
    pub path: String,
    pub viewport: String,
    pub browser: String,
    pub status: TargetStatus,
    pub duration_ms: u64,
    pub attempts: u32,
    pub error: Option<String>,
    #[serde(default)]
    pub checks: Vec<CheckResult>,
    pub report_path: Option<String>,
    pub screenshot: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    Passed,
    Failed,
    Skipped,
}

/// Aggregated outcome of the whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<TargetResult>,
}

impl SuiteResult {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Configuration for the audit runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub harness: HarnessConfig,

    /// Directory of YAML target manifests
    pub targets_dir: PathBuf,

    /// Output directory for reports and artifacts
    pub output_dir: PathBuf,

    /// Settle delay after body attachment
    pub settle_ms: u64,

    /// Hard cap per scripted browser session
    pub script_timeout_ms: u64,

    pub headless: bool,

    /// Global variable marking client-runtime readiness
    pub readiness_global: String,

    /// Dev server to spawn when not under CI (None = audit an existing site)
    pub server: Option<ServerConfig>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            harness: HarnessConfig::default(),
            targets_dir: PathBuf::from("targets"),
            output_dir: PathBuf::from("audit-results"),
            settle_ms: 2000,
            script_timeout_ms: 30_000,
            headless: true,
            readiness_global: "Drupal".to_string(),
            server: None,
        }
    }
}

/// Shared per-run state handed to worker tasks
struct RunContext {
    base_url: String,
    config: RunnerConfig,
}

/// Main audit runner
pub struct AuditRunner {
    config: RunnerConfig,
    server: Option<ServerHandle>,
}

impl AuditRunner {
    pub fn with_config(config: RunnerConfig) -> Self {
        Self {
            config,
            server: None,
        }
    }

    /// Start the dev server if one is configured and auto-start applies.
    pub async fn start_server(&mut self) -> HarnessResult<()> {
        if self.server.is_some() || !self.config.harness.auto_start_server() {
            return Ok(());
        }

        if let Some(server_config) = self.config.server.clone() {
            let server = ServerHandle::spawn(server_config).await?;
            self.config.harness.base_url = server.base_url().to_string();
            self.server = Some(server);
        }

        Ok(())
    }

    pub fn stop_server(&mut self) {
        if let Some(mut server) = self.server.take() {
            let _ = server.stop();
        }
    }

    /// Run every target enumerated from the manifests directory. Zero
    /// enumerated targets is a vacuous pass, not an error.
    pub async fn run_all(&mut self) -> HarnessResult<SuiteResult> {
        let manifests = TargetManifest::load_all(&self.config.targets_dir)?;
        let targets = enumerate_all(&manifests);

        if targets.is_empty() {
            warn!(
                "No audit targets under {} - nothing to do",
                self.config.targets_dir.display()
            );
            return Ok(SuiteResult {
                total: 0,
                passed: 0,
                failed: 0,
                skipped: 0,
                duration_ms: 0,
                results: Vec::new(),
            });
        }

        self.run_targets(targets).await
    }

    /// Run a specific list of targets.
    pub async fn run_targets(&mut self, targets: Vec<PageTarget>) -> HarnessResult<SuiteResult> {
        let start = Instant::now();

        PlaywrightBridge::check_installed()?;
        self.start_server().await?;

        bootstrap::global_setup(
            &self.config.harness.base_url,
            &self.config.readiness_global,
        )
        .await;

        let ctx = Arc::new(RunContext {
            base_url: self.config.harness.base_url.clone(),
            config: self.config.clone(),
        });

        info!("Auditing {} target(s)...", targets.len());

        let semaphore = Arc::new(Semaphore::new(self.config.harness.workers.max(1)));
        let mut join_set = JoinSet::new();

        for (index, target) in targets.into_iter().enumerate() {
            // Admin targets are skipped, not failed, without credentials
            if target.admin && ctx.config.harness.admin.is_none() {
                join_set.spawn(async move {
                    (index, skipped_result(&target, "admin credentials not configured"))
                });
                continue;
            }

            let ctx = Arc::clone(&ctx);
            let semaphore = Arc::clone(&semaphore);
            join_set.spawn(async move {
                let _permit = semaphore.acquire().await.expect("semaphore closed");
                let result = run_target(&ctx, &target).await;
                (index, result)
            });
        }

        let mut indexed: Vec<(usize, TargetResult)> = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(entry) => indexed.push(entry),
                Err(e) => error!("audit worker panicked: {}", e),
            }
        }
        indexed.sort_by_key(|(index, _)| *index);
        let results: Vec<TargetResult> = indexed.into_iter().map(|(_, r)| r).collect();

        let passed = results
            .iter()
            .filter(|r| r.status == TargetStatus::Passed)
            .count();
        let failed = results
            .iter()
            .filter(|r| r.status == TargetStatus::Failed)
            .count();
        let skipped = results
            .iter()
            .filter(|r| r.status == TargetStatus::Skipped)
            .count();

        let duration_ms = start.elapsed().as_millis() as u64;

        info!("");
        info!(
            "Audit results: {} passed, {} failed, {} skipped ({} ms)",
            passed, failed, skipped, duration_ms
        );

        bootstrap::global_teardown(&self.config.output_dir);

        Ok(SuiteResult {
            total: results.len(),
            passed,
            failed,
            skipped,
            duration_ms,
            results,
        })
    }

    /// Write the suite outputs: JSON results, JUnit XML and the HTML page.
    pub fn write_results(&self, suite: &SuiteResult) -> HarnessResult<Vec<PathBuf>> {
        reporter::write_all(suite, &self.config.output_dir)
    }
}

impl Drop for AuditRunner {
    fn drop(&mut self) {
        self.stop_server();
    }
}

fn skipped_result(target: &PageTarget, reason: &str) -> TargetResult {
    info!("- {} skipped: {}", target.name, reason);
    TargetResult {
        name: target.name.clone(),
        path: target.path.clone(),
        viewport: target.viewport.as_str().to_string(),
        browser: target.browser.as_str().to_string(),
        status: TargetStatus::Skipped,
        duration_ms: 0,
        attempts: 0,
        error: Some(reason.to_string()),
        checks: Vec::new(),
        report_path: None,
        screenshot: None,
    }
}

/// Run one target, retrying the whole navigate+scan+assert sequence from
/// scratch on failure. Every attempt gets a fresh browser session, so a
/// failed attempt leaves nothing behind for the next one.
async fn run_target(ctx: &RunContext, target: &PageTarget) -> TargetResult {
    let start = Instant::now();
    let retries = ctx.config.harness.retries;
    let mut attempts = 0;

    loop {
        attempts += 1;
        let last = audit_once(ctx, target).await;

        match &last.error {
            None => {
                let duration_ms = start.elapsed().as_millis() as u64;
                info!("✓ {} ({} ms)", target.name, duration_ms);
                return TargetResult {
                    name: target.name.clone(),
                    path: target.path.clone(),
                    viewport: target.viewport.as_str().to_string(),
                    browser: target.browser.as_str().to_string(),
                    status: TargetStatus::Passed,
                    duration_ms,
                    attempts,
                    error: None,
                    checks: last.checks,
                    report_path: last.report_path,
                    screenshot: None,
                };
            }
            Some(err) if attempts <= retries => {
                warn!(
                    "{} failed (attempt {}/{}): {} - retrying",
                    target.name,
                    attempts,
                    retries + 1,
                    err
                );
            }
            Some(err) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                error!("✗ {} - {}", target.name, err);
                return TargetResult {
                    name: target.name.clone(),
                    path: target.path.clone(),
                    viewport: target.viewport.as_str().to_string(),
                    browser: target.browser.as_str().to_string(),
                    status: TargetStatus::Failed,
                    duration_ms,
                    attempts,
                    error: Some(err.to_string()),
                    checks: last.checks,
                    report_path: last.report_path,
                    screenshot: last.screenshot,
                };
            }
        }
    }
}

/// Artifacts of one attempt. `error` is set instead of returned so partial
/// diagnostics (check outcomes, the attached report) survive a failure.
struct Attempt {
    checks: Vec<CheckResult>,
    report_path: Option<String>,
    screenshot: Option<String>,
    error: Option<HarnessError>,
}

impl Attempt {
    fn failed(error: HarnessError) -> Self {
        Self {
            checks: Vec::new(),
            report_path: None,
            screenshot: None,
            error: Some(error),
        }
    }
}

async fn audit_once(ctx: &RunContext, target: &PageTarget) -> Attempt {
    let bridge_config = BridgeConfig {
        base_url: ctx.base_url.clone(),
        browser: target.browser,
        viewport: target.viewport.dimensions(),
        settle_ms: ctx.config.settle_ms,
        script_timeout_ms: ctx.config.script_timeout_ms,
        headless: ctx.config.headless,
        screenshot_dir: ctx.config.output_dir.join("screenshots"),
    };

    let bridge = match PlaywrightBridge::new(bridge_config) {
        Ok(bridge) => bridge,
        Err(e) => return Attempt::failed(e),
    };

    let options = if target.admin {
        ScanOptions::admin().merged_over(ScanOptions::defaults())
    } else {
        ScanOptions::defaults()
    };

    let login = target.admin.then(|| {
        let credentials = ctx
            .config
            .harness
            .admin
            .as_ref()
            .expect("admin targets are filtered when credentials are absent");
        LoginStep::for_credentials(credentials)
    });

    let job = AuditJob {
        path: target.path.clone(),
        label: target.slug(),
        engine_options: options.engine_options(),
        login,
    };

    let payload = match bridge.run_audit(&job).await {
        Ok(payload) => payload,
        Err(e) => return Attempt::failed(e),
    };

    let scan = match payload.scan {
        Some(scan) => scan,
        None => {
            return Attempt::failed(HarnessError::Script {
                stage: "scan".to_string(),
                reason: "payload carried no scan results".to_string(),
            })
        }
    };
    let snapshot = match payload.snapshot {
        Some(snapshot) => snapshot,
        None => {
            return Attempt::failed(HarnessError::Script {
                stage: "snapshot".to_string(),
                reason: "payload carried no page snapshot".to_string(),
            })
        }
    };

    // Attach the accessibility report before asserting, so a failing target
    // still leaves its report behind for review.
    let report = Report::generate(&scan, &target.name, Utc::now());
    let report_path = match write_report(ctx, target, &report) {
        Ok(path) => Some(path),
        Err(e) => return Attempt::failed(e),
    };

    let checks = run_structural_checks(&snapshot);

    if let Err(e) = ensure_all_passed(&checks) {
        return Attempt {
            checks,
            report_path,
            screenshot: payload.screenshot,
            error: Some(e.into()),
        };
    }

    let mut allow: Vec<&str> = target.allow.iter().map(String::as_str).collect();
    if target.admin {
        allow.extend_from_slice(ADMIN_ALLOW);
    }

    if let Err(e) = siteaudit_core::assert_compliant(&scan, &allow) {
        return Attempt {
            checks,
            report_path,
            screenshot: payload.screenshot,
            error: Some(e.into()),
        };
    }

    Attempt {
        checks,
        report_path,
        screenshot: payload.screenshot,
        error: None,
    }
}

fn write_report(
    ctx: &RunContext,
    target: &PageTarget,
    report: &Report,
) -> HarnessResult<String> {
    let reports_dir = ctx.config.output_dir.join("reports");
    std::fs::create_dir_all(&reports_dir)?;

    let path = reports_dir.join(format!("{}.json", target.slug()));
    std::fs::write(&path, serde_json::to_string_pretty(report)?)?;

    Ok(path.to_string_lossy().to_string())
}
