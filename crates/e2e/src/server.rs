//! Local dev-server management
//!
//! When the harness is not running under CI it can spawn the site under test
//! itself: a configured command, an HTTP readiness poll, SIGTERM-then-kill on
//! shutdown. Under CI the site is provided externally and this module is
//! unused.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{HarnessError, HarnessResult};

/// Handle to a running dev-server process
pub struct ServerHandle {
    child: Child,
    pub base_url: String,
    pub port: u16,
}

impl ServerHandle {
    /// Spawn the configured server command and wait until it answers HTTP.
    pub async fn spawn(config: ServerConfig) -> HarnessResult<Self> {
        let port = config.port.unwrap_or_else(find_free_port);
        let base_url = format!("http://127.0.0.1:{}", port);

        info!("Spawning dev server on port {}", port);

        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .env("PORT", port.to_string())
            .envs(config.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = cmd.spawn().map_err(|e| {
            HarnessError::ServerStartup(format!(
                "failed to spawn {}: {}",
                config.command.display(),
                e
            ))
        })?;

        let handle = ServerHandle {
            child,
            base_url: base_url.clone(),
            port,
        };

        handle
            .wait_for_ready(&config.ready_path, config.startup_timeout)
            .await?;

        info!("Dev server is ready at {}", base_url);
        Ok(handle)
    }

    /// Poll the readiness path until it answers with a success status.
    async fn wait_for_ready(&self, ready_path: &str, timeout: Duration) -> HarnessResult<()> {
        let ready_url = format!("{}{}", self.base_url, ready_path);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout {
            attempts += 1;

            match client.get(&ready_url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    return Ok(());
                }
                Ok(resp) => {
                    warn!("Readiness poll returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for dev server to start...");
                    }
                    // Connection refused is expected while starting up
                    if !e.is_connect() {
                        warn!("Readiness poll error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(100)).await;
        }

        Err(HarnessError::ServerHealthCheck(attempts))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stop the server, graceful first.
    pub fn stop(&mut self) -> HarnessResult<()> {
        info!("Stopping dev server (pid: {})", self.child.id());

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(500));
            }
        }

        let _ = self.child.kill();
        let _ = self.child.wait();

        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Configuration for spawning the site under test locally
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Command that serves the site
    pub command: PathBuf,

    /// Arguments passed to the command
    pub args: Vec<String>,

    /// Extra environment for the server process
    pub env: Vec<(String, String)>,

    /// Port to listen on (None = find free port); exported as `PORT`
    pub port: Option<u16>,

    /// Path polled for readiness
    pub ready_path: String,

    /// Timeout for server startup
    pub startup_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: PathBuf::from("./scripts/serve-site"),
            args: Vec::new(),
            env: Vec::new(),
            port: None,
            ready_path: "/".to_string(),
            startup_timeout: Duration::from_secs(30),
        }
    }
}

/// Find a free port to use
fn find_free_port() -> u16 {
    use std::net::TcpListener;

    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to find free port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}
