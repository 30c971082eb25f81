//! Scan configuration
//!
//! A typed options struct with explicit field-wise precedence: caller-supplied
//! fields win over the defaults, absent fields fall through. The resolved
//! configuration serializes to the option format the in-page rule engine
//! understands.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::snapshot::LAYOUT_CONTENT_SELECTOR;

/// Compliance tags selected by default: Section 508 plus WCAG 2.0/2.1 A/AA.
pub const DEFAULT_TAGS: &[&str] = &["section508", "wcag2a", "wcag2aa", "wcag21aa"];

/// Default scan scope: layout-content containers, block containers and the
/// standard landmark tags.
pub const DEFAULT_INCLUDE: &[&str] = &[
    LAYOUT_CONTENT_SELECTOR,
    ".layout-content",
    ".block",
    "main",
    "article",
    "section",
    "nav",
    "header",
    "footer",
];

/// Admin toolbars and development widgets excluded from every scan.
pub const DEFAULT_EXCLUDE: &[&str] = &[
    "#toolbar-administration",
    ".contextual-toolbar",
    ".dev-toolbar",
];

/// Per-rule enable/disable override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleToggle {
    pub enabled: bool,
}

impl RuleToggle {
    pub fn enabled() -> Self {
        Self { enabled: true }
    }

    pub fn disabled() -> Self {
        Self { enabled: false }
    }
}

/// Scan configuration. Every field is optional; [`ScanOptions::merged_over`]
/// resolves a caller configuration against a base, caller fields winning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Compliance tags selecting which rules run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    /// Selectors scoping the DOM subtrees scanned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,

    /// Selectors removed from the scan scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,

    /// Rule-id to enable/disable overrides. BTreeMap keeps the serialized
    /// form deterministic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<BTreeMap<String, RuleToggle>>,
}

impl ScanOptions {
    /// The default public-page policy. The generic `region` rule is disabled:
    /// composed layout containers legitimately create multiple regions.
    pub fn defaults() -> Self {
        let mut rules = BTreeMap::new();
        rules.insert("region".to_string(), RuleToggle::disabled());

        Self {
            tags: Some(owned(DEFAULT_TAGS)),
            include: Some(owned(DEFAULT_INCLUDE)),
            exclude: Some(owned(DEFAULT_EXCLUDE)),
            rules: Some(rules),
        }
    }

    /// The lenient admin-interface policy: WCAG 2.0 A plus Section 508 only,
    /// toolbars still excluded. Scope falls through to the defaults on merge.
    pub fn admin() -> Self {
        Self {
            tags: Some(vec!["wcag2a".to_string(), "section508".to_string()]),
            include: None,
            exclude: Some(owned(DEFAULT_EXCLUDE)),
            rules: None,
        }
    }

    /// Shallow precedence merge: fields set on `self` win, fields left unset
    /// fall back to `base`.
    pub fn merged_over(self, base: Self) -> Self {
        Self {
            tags: self.tags.or(base.tags),
            include: self.include.or(base.include),
            exclude: self.exclude.or(base.exclude),
            rules: self.rules.or(base.rules),
        }
    }

    /// Resolve a caller configuration against the default policy.
    pub fn resolve(caller: Option<Self>) -> Self {
        match caller {
            Some(options) => options.merged_over(Self::defaults()),
            None => Self::defaults(),
        }
    }

    /// Serialize to the engine's option object: scope selectors plus the
    /// run-only tag filter and rule overrides.
    pub fn engine_options(&self) -> serde_json::Value {
        serde_json::json!({
            "include": self.include.clone().unwrap_or_default(),
            "exclude": self.exclude.clone().unwrap_or_default(),
            "tags": self.tags.clone().unwrap_or_default(),
            "rules": self.rules.clone().unwrap_or_default(),
        })
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_fields_win_over_defaults() {
        let caller = ScanOptions {
            tags: Some(vec!["wcag2a".to_string()]),
            ..Default::default()
        };

        let merged = caller.merged_over(ScanOptions::defaults());
        assert_eq!(merged.tags.as_deref(), Some(&["wcag2a".to_string()][..]));
        // Unset caller fields fall through to defaults
        assert_eq!(merged.include, ScanOptions::defaults().include);
        assert!(merged.rules.unwrap().contains_key("region"));
    }

    #[test]
    fn resolve_without_caller_is_defaults() {
        assert_eq!(ScanOptions::resolve(None), ScanOptions::defaults());
    }

    #[test]
    fn defaults_disable_region_rule() {
        let defaults = ScanOptions::defaults();
        let rules = defaults.rules.unwrap();
        assert_eq!(rules.get("region"), Some(&RuleToggle::disabled()));
    }

    #[test]
    fn engine_options_shape() {
        let value = ScanOptions::defaults().engine_options();
        assert!(value["tags"].as_array().unwrap().iter().any(|t| t == "section508"));
        assert!(value["include"].as_array().unwrap().iter().any(|s| s == "[data-layout-content]"));
        assert_eq!(value["rules"]["region"]["enabled"], serde_json::json!(false));
    }

    #[test]
    fn admin_policy_is_lenient() {
        let admin = ScanOptions::admin().merged_over(ScanOptions::defaults());
        assert_eq!(
            admin.tags.as_deref(),
            Some(&["wcag2a".to_string(), "section508".to_string()][..])
        );
        // The policy leaves scope unset; the merge fills it from defaults
        assert_eq!(ScanOptions::admin().include, None);
        assert_eq!(admin.include, ScanOptions::defaults().include);
    }
}
