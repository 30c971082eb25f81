//! Scan-result model
//!
//! Mirrors the JSON the in-page rule engine produces: four categorized
//! sequences of rule outcomes, each outcome carrying the DOM nodes it
//! matched. Deserialized once per scan and treated as immutable.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Full result of one rule-evaluation pass over a page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanResults {
    #[serde(default)]
    pub violations: Vec<RuleOutcome>,
    #[serde(default)]
    pub passes: Vec<RuleOutcome>,
    #[serde(default)]
    pub incomplete: Vec<RuleOutcome>,
    #[serde(default)]
    pub inapplicable: Vec<RuleOutcome>,
    /// URL the engine reported for the scanned document.
    #[serde(default)]
    pub url: String,
}

impl ScanResults {
    /// Parse engine output from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A single rule's outcome, with every DOM node it matched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub id: String,
    #[serde(default)]
    pub impact: Option<Impact>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub help: String,
    #[serde(default, rename = "helpUrl")]
    pub help_url: String,
    #[serde(default)]
    pub nodes: Vec<NodeResult>,
}

impl RuleOutcome {
    /// Every target selector this rule matched, across all nodes, in order.
    pub fn all_targets(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .flat_map(|n| n.target.iter().map(String::as_str))
            .collect()
    }
}

/// One matched DOM node: its selector chain and, for violations, the
/// engine's failure summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeResult {
    #[serde(default)]
    pub target: Vec<String>,
    #[serde(default, rename = "failureSummary")]
    pub failure_summary: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

impl NodeResult {
    /// The primary selector for this node, if any.
    pub fn first_target(&self) -> Option<&str> {
        self.target.first().map(String::as_str)
    }
}

/// Impact severity as reported by the rule engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Minor,
    Moderate,
    Serious,
    Critical,
}
