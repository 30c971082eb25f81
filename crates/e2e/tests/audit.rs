//! Audit harness entry point
//!
//! This file is the test binary that runs accessibility audits from YAML
//! target manifests. Run with: cargo test --package siteaudit-e2e --test audit

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use siteaudit_e2e::runner::RunnerConfig;
use siteaudit_e2e::server::ServerConfig;
use siteaudit_e2e::{AuditRunner, HarnessConfig, HarnessResult};

#[derive(Parser, Debug)]
#[command(name = "siteaudit")]
#[command(about = "Accessibility audit runner")]
struct Args {
    /// Path to the target manifests directory
    #[arg(short, long, default_value = "targets")]
    targets: PathBuf,

    /// Base URL of the site under test (overrides BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Concurrent audit workers (overrides the CI-derived default)
    #[arg(long)]
    workers: Option<usize>,

    /// Full-target retries on failure (overrides the CI-derived default)
    #[arg(long)]
    retries: Option<u32>,

    /// Settle delay after body attachment, in milliseconds
    #[arg(long, default_value = "2000")]
    settle_ms: u64,

    /// Hard cap per scripted browser session, in milliseconds
    #[arg(long, default_value = "30000")]
    script_timeout_ms: u64,

    /// Run browsers headless
    #[arg(long, action = clap::ArgAction::Set, default_value_t = true)]
    headless: bool,

    /// Global variable marking client-runtime readiness
    #[arg(long, default_value = "Drupal")]
    readiness_global: String,

    /// Command serving the site locally (skipped under CI)
    #[arg(long)]
    server_command: Option<PathBuf>,

    /// Port for the local server (0 = auto)
    #[arg(long, default_value = "0")]
    server_port: u16,

    /// Output directory for results and artifacts
    #[arg(short, long, default_value = "audit-results")]
    output: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("info".parse().expect("valid directive")),
        )
        .init();

    let args = Args::parse();

    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    let result = rt.block_on(async_main(args));

    match result {
        Ok(success) => {
            if success {
                std::process::exit(0);
            } else {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> HarnessResult<bool> {
    let mut harness = HarnessConfig::from_env();
    if let Some(base_url) = args.base_url {
        harness.base_url = base_url;
    }
    if let Some(workers) = args.workers {
        harness.workers = workers;
    }
    if let Some(retries) = args.retries {
        harness.retries = retries;
    }

    let server = args.server_command.map(|command| ServerConfig {
        command,
        port: (args.server_port != 0).then_some(args.server_port),
        startup_timeout: Duration::from_secs(30),
        ..Default::default()
    });

    let config = RunnerConfig {
        harness,
        targets_dir: args.targets,
        output_dir: args.output,
        settle_ms: args.settle_ms,
        script_timeout_ms: args.script_timeout_ms,
        headless: args.headless,
        readiness_global: args.readiness_global,
        server,
    };

    let mut runner = AuditRunner::with_config(config);
    let suite = runner.run_all().await?;
    runner.write_results(&suite)?;

    Ok(suite.all_passed())
}
