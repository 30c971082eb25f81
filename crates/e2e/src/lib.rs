//! SiteAudit browser harness
//!
//! Drives accessibility audits against a live site:
//! - Enumerates page targets from declarative YAML manifests
//! - Controls Playwright via generated scripts and a JSON payload protocol
//! - Injects the rule engine, scans, and extracts structural page snapshots
//! - Applies the compliance policy and structural checks from
//!   `siteaudit-core`, attaches per-target reports, and aggregates results
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     AuditRunner (Rust)                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  run_all()                                                   │
//! │    ├── TargetManifest::load_all() -> [PageTarget]            │
//! │    ├── bootstrap::global_setup()      (advisory pre-flight)  │
//! │    ├── per target (parallel, isolated):                      │
//! │    │     PlaywrightBridge::run_audit() -> AuditPayload       │
//! │    │       navigate -> settle -> inject engine -> scan       │
//! │    │       -> snapshot -> (screenshot on failure)            │
//! │    │     Report::generate() -> attached JSON artifact        │
//! │    │     run_structural_checks() + assert_compliant()        │
//! │    └── reporter::write_all() -> JSON + JUnit XML + HTML      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod playwright;
pub mod reporter;
pub mod runner;
pub mod server;
pub mod targets;

pub use config::{AdminCredentials, HarnessConfig};
pub use error::{HarnessError, HarnessResult};
pub use runner::{AuditRunner, RunnerConfig, SuiteResult, TargetResult, TargetStatus};
pub use targets::{Browser, PageTarget, TargetManifest, ViewportPreset};
