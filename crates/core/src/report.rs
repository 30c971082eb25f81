//! Accessibility report generation
//!
//! Transforms a scan result plus a page identifier into the stable summary
//! record attached to each audit: counts per category and per-violation
//! detail. Pure given its inputs; the timestamp is taken once by the caller
//! and passed in.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::scan::{Impact, ScanResults};

/// The per-page report artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub page: String,
    /// ISO-8601, taken once at generation time.
    pub timestamp: String,
    pub summary: Summary,
    pub violations: Vec<ReportedViolation>,
    pub pass_count: usize,
    pub url: String,
}

/// Counts per scan-result category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub violations: usize,
    pub passes: usize,
    pub incomplete: usize,
    pub inapplicable: usize,
}

/// Condensed violation detail: one entry per rule, with the first target
/// selector of every matched node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedViolation {
    pub id: String,
    pub impact: Option<Impact>,
    pub description: String,
    pub help: String,
    pub help_url: String,
    pub node_count: usize,
    pub targets: Vec<String>,
}

impl Report {
    /// Build a report from a scan result. Deterministic given identical
    /// inputs and timestamp.
    pub fn generate(results: &ScanResults, page: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            page: page.to_string(),
            timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            summary: Summary {
                violations: results.violations.len(),
                passes: results.passes.len(),
                incomplete: results.incomplete.len(),
                inapplicable: results.inapplicable.len(),
            },
            violations: results
                .violations
                .iter()
                .map(|violation| ReportedViolation {
                    id: violation.id.clone(),
                    impact: violation.impact,
                    description: violation.description.clone(),
                    help: violation.help.clone(),
                    help_url: violation.help_url.clone(),
                    node_count: violation.nodes.len(),
                    targets: violation
                        .nodes
                        .iter()
                        .filter_map(|node| node.first_target())
                        .map(String::from)
                        .collect(),
                })
                .collect(),
            pass_count: results.passes.len(),
            url: results.url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{NodeResult, RuleOutcome};
    use chrono::TimeZone;

    fn sample_results() -> ScanResults {
        ScanResults {
            violations: vec![RuleOutcome {
                id: "image-alt".to_string(),
                impact: Some(Impact::Critical),
                description: "Images must have alternate text".to_string(),
                help: "Images must have alternate text".to_string(),
                help_url: "https://example.org/rules/image-alt".to_string(),
                nodes: vec![
                    NodeResult {
                        target: vec!["img.hero".to_string()],
                        failure_summary: None,
                        html: None,
                    },
                    NodeResult {
                        target: vec!["img.footer".to_string(), "span".to_string()],
                        failure_summary: None,
                        html: None,
                    },
                ],
            }],
            passes: vec![
                RuleOutcome {
                    id: "document-title".to_string(),
                    impact: None,
                    description: String::new(),
                    help: String::new(),
                    help_url: String::new(),
                    nodes: vec![],
                },
                RuleOutcome {
                    id: "html-has-lang".to_string(),
                    impact: None,
                    description: String::new(),
                    help: String::new(),
                    help_url: String::new(),
                    nodes: vec![],
                },
            ],
            incomplete: vec![],
            inapplicable: vec![],
            url: "http://localhost:8080/about".to_string(),
        }
    }

    #[test]
    fn summary_counts_match_categories() {
        let results = sample_results();
        let when = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let report = Report::generate(&results, "/about", when);

        assert_eq!(report.summary.violations, results.violations.len());
        assert_eq!(report.summary.passes, results.passes.len());
        assert_eq!(report.summary.incomplete, 0);
        assert_eq!(report.summary.inapplicable, 0);
        assert_eq!(report.pass_count, 2);
        assert_eq!(report.url, "http://localhost:8080/about");
    }

    #[test]
    fn violation_detail_takes_first_target_per_node() {
        let when = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let report = Report::generate(&sample_results(), "/about", when);

        let detail = &report.violations[0];
        assert_eq!(detail.node_count, 2);
        assert_eq!(detail.targets, vec!["img.hero", "img.footer"]);
    }

    #[test]
    fn serialized_form_is_camel_case() {
        let when = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let report = Report::generate(&sample_results(), "/about", when);
        let json = serde_json::to_value(&report).unwrap();

        assert!(json.get("passCount").is_some());
        assert!(json["violations"][0].get("helpUrl").is_some());
        assert!(json["violations"][0].get("nodeCount").is_some());
    }

    #[test]
    fn deterministic_for_fixed_timestamp() {
        let results = sample_results();
        let when = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let a = serde_json::to_string(&Report::generate(&results, "/about", when)).unwrap();
        let b = serde_json::to_string(&Report::generate(&results, "/about", when)).unwrap();
        assert_eq!(a, b);
    }
}
