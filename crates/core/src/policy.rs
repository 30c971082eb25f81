//! Compliance assertion policy
//!
//! Decides pass/fail for a scan result against an allow-list of rule ids.
//! Allow-listed violations are suppressed from the assertion only; they stay
//! visible in the scan result and in any report generated from it.

use crate::error::{AuditError, Result};
use crate::scan::ScanResults;

/// Assert that a scan found no violations outside the allow-list.
///
/// On failure the error message enumerates, in input order, every remaining
/// violation: rule id, description and the comma-joined target selectors of
/// every node it matched. Deterministic for identical inputs.
pub fn assert_compliant(results: &ScanResults, allow_list: &[&str]) -> Result<()> {
    let remaining: Vec<_> = results
        .violations
        .iter()
        .filter(|violation| !allow_list.contains(&violation.id.as_str()))
        .collect();

    if remaining.is_empty() {
        return Ok(());
    }

    let message = remaining
        .iter()
        .map(|violation| {
            format!(
                "{}: {} (found on: {})",
                violation.id,
                violation.description,
                violation.all_targets().join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    Err(AuditError::Compliance(message))
}
