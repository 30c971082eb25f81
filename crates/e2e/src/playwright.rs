//! Playwright browser automation
//!
//! Builds a self-contained audit script per page target, runs it via `node`,
//! and parses the single JSON payload the script prints: the rule-engine scan
//! plus the structural page snapshot. The engine is injected idempotently —
//! the script guards on the engine global before adding the script tag.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::process::Command as TokioCommand;
use tracing::debug;

use siteaudit_core::scan::ScanResults;
use siteaudit_core::snapshot::{
    focusable_selector, PageSnapshot, LAYOUT_CONTENT_SELECTOR, MESSAGE_SELECTOR,
};

use crate::config::AdminCredentials;
use crate::error::{HarnessError, HarnessResult};
use crate::targets::{Browser, Viewport};

/// Configuration for one scripted browser session.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub base_url: String,
    pub browser: Browser,
    pub viewport: Viewport,
    /// Fixed delay after body attachment, for client-side enhancement
    /// scripts that run after initial load.
    pub settle_ms: u64,
    /// Hard cap on one scripted session, navigation included.
    pub script_timeout_ms: u64,
    pub headless: bool,
    /// Directory for failure screenshots.
    pub screenshot_dir: PathBuf,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            browser: Browser::Chromium,
            viewport: Viewport {
                width: 1200,
                height: 800,
            },
            settle_ms: 2000,
            script_timeout_ms: 30_000,
            headless: true,
            screenshot_dir: PathBuf::from("audit-results/screenshots"),
        }
    }
}

/// One audit unit handed to the bridge.
#[derive(Debug, Clone)]
pub struct AuditJob {
    /// Route relative to the base URL.
    pub path: String,
    /// Filesystem-safe label for failure screenshots.
    pub label: String,
    /// Resolved engine options (tags/include/exclude/rules).
    pub engine_options: serde_json::Value,
    /// Present for admin targets: log in before navigating.
    pub login: Option<LoginStep>,
}

/// Form login performed before the audited navigation, in the same
/// (non-shared) browser context.
#[derive(Debug, Clone)]
pub struct LoginStep {
    pub path: String,
    pub user_field: String,
    pub password_field: String,
    pub submit: String,
    pub user: String,
    pub password: String,
}

impl LoginStep {
    /// Standard login form selectors.
    pub fn for_credentials(credentials: &AdminCredentials) -> Self {
        Self {
            path: "/user/login".to_string(),
            user_field: "input[name=\"name\"]".to_string(),
            password_field: "input[name=\"pass\"]".to_string(),
            submit: "[type=\"submit\"]".to_string(),
            user: credentials.user.clone(),
            password: credentials.password.clone(),
        }
    }
}

/// What the audit script prints on its single stdout line.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuditPayload {
    pub ok: bool,
    /// The stage the script was in when it finished or failed:
    /// navigate, engine, scan, snapshot, done.
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub scan: Option<ScanResults>,
    #[serde(default)]
    pub snapshot: Option<PageSnapshot>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub screenshot: Option<String>,
}

/// Drives one scripted Playwright session per call.
pub struct PlaywrightBridge {
    config: BridgeConfig,
}

impl PlaywrightBridge {
    pub fn new(config: BridgeConfig) -> HarnessResult<Self> {
        std::fs::create_dir_all(&config.screenshot_dir)?;
        Ok(Self { config })
    }

    /// Check that the Playwright CLI is reachable.
    pub fn check_installed() -> HarnessResult<()> {
        let status = std::process::Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(HarnessError::PlaywrightNotFound),
        }
    }

    /// Run the full audit script for one job and return its payload.
    /// Stage-specific failures are mapped to the harness error taxonomy.
    pub async fn run_audit(&self, job: &AuditJob) -> HarnessResult<AuditPayload> {
        let script = self.build_audit_script(job);
        let payload = self
            .run_script(&script, &format!("audit of {}", job.path))
            .await?;

        if payload.ok {
            return Ok(payload);
        }

        let reason = payload
            .error
            .clone()
            .unwrap_or_else(|| "unknown error".to_string());
        match payload.stage.as_str() {
            "engine" => Err(HarnessError::EngineUnavailable(reason)),
            stage => Err(HarnessError::Script {
                stage: stage.to_string(),
                reason,
            }),
        }
    }

    /// Probe the target's client-runtime readiness marker. Returns whether
    /// the global is defined; errors are the caller's to treat as advisory.
    pub async fn probe_readiness(&self, global: &str) -> HarnessResult<bool> {
        let script = self.build_readiness_script(global);
        let payload = self.run_script(&script, "readiness probe").await?;
        if let Some(error) = payload.error {
            return Err(HarnessError::Script {
                stage: payload.stage,
                reason: error,
            });
        }
        Ok(payload.ok)
    }

    /// Build the audit script: navigate, settle, inject the rule engine if
    /// absent, scan, extract the structural snapshot, screenshot on failure.
    pub fn build_audit_script(&self, job: &AuditJob) -> String {
        let mut script = String::new();

        script.push_str(&self.script_header());

        if let Some(login) = &job.login {
            script.push_str(&format!(
                r#"
    await page.goto(baseUrl + {path}, {{ waitUntil: 'networkidle' }});
    await page.fill({user_field}, {user});
    await page.fill({password_field}, {password});
    await page.click({submit});
    await page.waitForLoadState('networkidle');
"#,
                path = js_str(&login.path),
                user_field = js_str(&login.user_field),
                user = js_str(&login.user),
                password_field = js_str(&login.password_field),
                password = js_str(&login.password),
                submit = js_str(&login.submit),
            ));
        }

        script.push_str(&format!(
            r#"
    await page.goto(baseUrl + {path}, {{ waitUntil: 'networkidle' }});
    await page.waitForSelector('body', {{ state: 'attached' }});
    await page.waitForTimeout({settle});
    payload.url = page.url();

    payload.stage = 'engine';
    const engineLoaded = await page.evaluate(() => typeof window.axe !== 'undefined');
    if (!engineLoaded) {{
      await page.addScriptTag({{ path: require.resolve('axe-core/axe.min.js') }});
    }}

    payload.stage = 'scan';
    const scanOptions = {options};
    payload.scan = await page.evaluate((opts) => {{
      return axe.run(
        {{ include: opts.include, exclude: opts.exclude }},
        {{ runOnly: {{ type: 'tag', values: opts.tags }}, rules: opts.rules }}
      );
    }}, scanOptions);

    payload.stage = 'snapshot';
    payload.snapshot = await page.evaluate({snapshot_fn}, {snapshot_cfg});

    payload.stage = 'done';
    payload.ok = true;
"#,
            path = js_str(&job.path),
            settle = self.config.settle_ms,
            options = job.engine_options,
            snapshot_fn = SNAPSHOT_FN,
            snapshot_cfg = snapshot_cfg_json(),
        ));

        script.push_str(&self.script_footer(Some(&self.screenshot_path(&job.label))));
        script
    }

    /// Build the readiness-probe script: navigate and report whether the
    /// configured runtime global is defined.
    pub fn build_readiness_script(&self, global: &str) -> String {
        let mut script = String::new();
        script.push_str(&self.script_header());
        script.push_str(&format!(
            r#"
    await page.goto(baseUrl, {{ waitUntil: 'networkidle' }});
    payload.url = page.url();
    payload.stage = 'done';
    payload.ok = await page.evaluate((name) => typeof window[name] !== 'undefined', {global});
"#,
            global = js_str(global),
        ));
        script.push_str(&self.script_footer(None));
        script
    }

    fn script_header(&self) -> String {
        format!(
            r#"const {{ chromium, firefox, webkit }} = require('playwright');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  const baseUrl = {base_url};
  const payload = {{ ok: false, stage: 'navigate', url: null, scan: null, snapshot: null, error: null, screenshot: null }};

  try {{
"#,
            browser = self.config.browser.as_str(),
            headless = self.config.headless,
            width = self.config.viewport.width,
            height = self.config.viewport.height,
            base_url = js_str(&self.config.base_url),
        )
    }

    fn script_footer(&self, screenshot: Option<&str>) -> String {
        let capture = match screenshot {
            Some(path) => format!(
                r#"    try {{ await page.screenshot({{ path: {path}, fullPage: true }}); payload.screenshot = {path}; }} catch (ignored) {{}}
"#,
                path = js_str(path),
            ),
            None => String::new(),
        };

        format!(
            r#"  }} catch (error) {{
    payload.error = error.message;
{capture}  }} finally {{
    console.log(JSON.stringify(payload));
    await browser.close();
  }}
}})();
"#,
        )
    }

    fn screenshot_path(&self, label: &str) -> String {
        self.config
            .screenshot_dir
            .join(format!("{label}.png"))
            .to_string_lossy()
            .to_string()
    }

    /// Write the script to a scratch file and run it with `node`, bounded by
    /// the configured timeout. The script's stdout is the payload.
    async fn run_script(&self, script: &str, operation: &str) -> HarnessResult<AuditPayload> {
        let scratch = tempfile::tempdir()?;
        let script_path = scratch.path().join("audit.js");
        std::fs::write(&script_path, script)?;

        debug!("Running audit script: {}", script_path.display());

        // The script lives in a scratch dir, so module resolution needs to be
        // pointed back at the project's node_modules.
        let mut cmd = TokioCommand::new("node");
        cmd.arg(&script_path);
        if let Ok(cwd) = std::env::current_dir() {
            cmd.env("NODE_PATH", cwd.join("node_modules"));
        }
        let run = cmd.output();

        let output = tokio::time::timeout(
            Duration::from_millis(self.config.script_timeout_ms),
            run,
        )
        .await
        .map_err(|_| HarnessError::Timeout {
            operation: operation.to_string(),
            ms: self.config.script_timeout_ms,
        })??;

        let stdout = String::from_utf8_lossy(&output.stdout);
        match Self::parse_payload(&stdout) {
            Some(payload) => Ok(payload),
            None => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(HarnessError::Script {
                    stage: "launch".to_string(),
                    reason: format!("no payload on stdout\nstdout: {stdout}\nstderr: {stderr}"),
                })
            }
        }
    }

    /// Parse the payload from script stdout: the last non-empty line.
    pub fn parse_payload(stdout: &str) -> Option<AuditPayload> {
        let line = stdout.lines().rev().find(|l| !l.trim().is_empty())?;
        serde_json::from_str(line.trim()).ok()
    }
}

/// The in-page snapshot extraction function, interpolated verbatim into the
/// audit script. Collects every DOM fact the structural checks consume and
/// probes focus behavior of interactive layout-content descendants.
const SNAPSHOT_FN: &str = r#"(cfg) => {
      const describe = (el) => {
        const tag = el.tagName.toLowerCase();
        if (el.id) return tag + '#' + el.id;
        if (el.classList.length > 0) return tag + '.' + el.classList[0];
        return tag;
      };
      const attr = (el, name) => el.hasAttribute(name) ? el.getAttribute(name) : null;

      const headings = [...document.querySelectorAll('h1, h2, h3, h4, h5, h6')].map(el => ({
        selector: describe(el),
        level: parseInt(el.tagName.substring(1), 10),
        text: (el.textContent || '').trim()
      }));

      const images = [...document.querySelectorAll('img')].map(el => ({
        selector: describe(el),
        src: attr(el, 'src') || '',
        alt: attr(el, 'alt'),
        role: attr(el, 'role')
      }));

      const links = [...document.querySelectorAll('a[href]')].map(el => ({
        selector: describe(el),
        href: attr(el, 'href') || '',
        text: el.textContent || '',
        ariaLabel: attr(el, 'aria-label'),
        title: attr(el, 'title')
      }));

      const formControls = [...document.querySelectorAll('input, select, textarea')].map(el => {
        const id = attr(el, 'id');
        return {
          selector: describe(el),
          controlType: el.tagName.toLowerCase() === 'input' ? (attr(el, 'type') || 'text') : null,
          id,
          hasLabelFor: id ? document.querySelector('label[for="' + CSS.escape(id) + '"]') !== null : false,
          ariaLabel: attr(el, 'aria-label'),
          ariaLabelledby: attr(el, 'aria-labelledby')
        };
      });

      const liveRegions = [...document.querySelectorAll('[aria-live]')].map(el => ({
        selector: describe(el),
        value: attr(el, 'aria-live') || ''
      }));

      const messages = [...document.querySelectorAll(cfg.messageSelector)].map(el => ({
        selector: describe(el),
        role: attr(el, 'role'),
        ariaLive: attr(el, 'aria-live')
      }));

      const draggables = [...document.querySelectorAll('[draggable="true"]')].map(el => ({
        selector: describe(el),
        ariaGrabbed: el.hasAttribute('aria-grabbed'),
        ariaDropeffect: el.hasAttribute('aria-dropeffect'),
        tabStop: el.hasAttribute('tabindex'),
        nestedButton: el.querySelector('[role="button"]') !== null
      }));

      const layoutRegions = [...document.querySelectorAll(cfg.layoutSelector)].map(el => ({
        selector: describe(el),
        role: attr(el, 'role'),
        tag: el.tagName.toLowerCase()
      }));

      const focusables = [...document.querySelectorAll(cfg.focusableSelector)].map(el => {
        el.focus();
        const focusable = document.activeElement === el;
        const styles = window.getComputedStyle(el);
        const focusVisible = focusable &&
          (styles.outlineStyle !== 'none' || styles.boxShadow !== 'none');
        return { selector: describe(el), focusable, focusVisible };
      });
      if (document.activeElement && document.activeElement.blur) {
        document.activeElement.blur();
      }

      return { url: document.location.href, headings, images, links, formControls,
               liveRegions, messages, draggables, layoutRegions, focusables };
    }"#;

fn snapshot_cfg_json() -> String {
    serde_json::json!({
        "layoutSelector": LAYOUT_CONTENT_SELECTOR,
        "messageSelector": MESSAGE_SELECTOR,
        "focusableSelector": focusable_selector(),
    })
    .to_string()
}

/// Quote a Rust string as a JS string literal. JSON string syntax is valid
/// JS, so this also covers embedded quotes and control characters.
fn js_str(value: &str) -> String {
    serde_json::to_string(value).expect("string serialization is infallible")
}

#[cfg(test)]
mod tests {
    use super::*;
    use siteaudit_core::ScanOptions;

    fn job() -> AuditJob {
        AuditJob {
            path: "/about".to_string(),
            label: "_about_desktop_chromium".to_string(),
            engine_options: ScanOptions::defaults().engine_options(),
            login: None,
        }
    }

    #[test]
    fn audit_script_guards_engine_injection() {
        let bridge = PlaywrightBridge::new(BridgeConfig {
            screenshot_dir: std::env::temp_dir(),
            ..Default::default()
        })
        .unwrap();
        let script = bridge.build_audit_script(&job());

        assert!(script.contains("typeof window.axe !== 'undefined'"));
        assert!(script.contains("axe-core/axe.min.js"));
        assert!(script.contains("baseUrl + \"/about\""));
        assert!(script.contains("waitForTimeout(2000)"));
        assert!(script.contains("\"section508\""));
        // The engine run is scoped by the resolved include/exclude lists
        assert!(script.contains("[data-layout-content]"));
        assert!(script.contains("#toolbar-administration"));
    }

    #[test]
    fn login_block_only_present_for_admin_jobs() {
        let bridge = PlaywrightBridge::new(BridgeConfig {
            screenshot_dir: std::env::temp_dir(),
            ..Default::default()
        })
        .unwrap();

        let without = bridge.build_audit_script(&job());
        assert!(!without.contains("/user/login"));

        let credentials = AdminCredentials {
            user: "auditor".to_string(),
            password: "s3cret\"quote".to_string(),
        };
        let with = bridge.build_audit_script(&AuditJob {
            login: Some(LoginStep::for_credentials(&credentials)),
            ..job()
        });
        assert!(with.contains("/user/login"));
        // Credentials are JSON-quoted, embedded quotes stay escaped
        assert!(with.contains(r#""s3cret\"quote""#));
    }

    #[test]
    fn payload_parses_from_last_stdout_line() {
        let stdout = "some noise\n{\"ok\":true,\"stage\":\"done\",\"url\":\"http://x/\"}\n";
        let payload = PlaywrightBridge::parse_payload(stdout).unwrap();
        assert!(payload.ok);
        assert_eq!(payload.stage, "done");
        assert_eq!(payload.url.as_deref(), Some("http://x/"));
    }

    #[test]
    fn garbage_stdout_yields_no_payload() {
        assert!(PlaywrightBridge::parse_payload("").is_none());
        assert!(PlaywrightBridge::parse_payload("not json at all").is_none());
    }

    #[test]
    fn viewport_dimensions_reach_the_script() {
        let bridge = PlaywrightBridge::new(BridgeConfig {
            viewport: Viewport {
                width: 375,
                height: 667,
            },
            browser: Browser::Webkit,
            screenshot_dir: std::env::temp_dir(),
            ..Default::default()
        })
        .unwrap();
        let script = bridge.build_audit_script(&job());
        assert!(script.contains("width: 375, height: 667"));
        assert!(script.contains("webkit.launch"));
    }
}
