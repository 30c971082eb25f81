//! Structural accessibility checks
//!
//! Narrow predicates the rule engine does not cover, each evaluated over the
//! page snapshot. Checks are independent: a check with zero applicable
//! elements is skipped, a failing element fails its check but later elements
//! are still evaluated so the diagnostic is complete. The landmark check
//! warns instead of failing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::{AuditError, Result};
use crate::snapshot::PageSnapshot;

/// Landmark ARIA roles recognized on layout-content containers.
const LANDMARK_ROLES: &[&str] = &[
    "main",
    "navigation",
    "banner",
    "contentinfo",
    "complementary",
    "search",
    "form",
];

/// Native tags treated as landmark-equivalent.
const LANDMARK_TAGS: &[&str] = &["main", "nav", "header", "footer", "aside", "section"];

/// Generic link phrases that need disambiguating context.
const GENERIC_LINK_TEXT: &[&str] = &["click here", "read more", "here", "more", "link"];

static FILENAME_ALT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(jpg|jpeg|png|gif|svg|webp)$").expect("valid pattern"));

/// One element that failed a check, and the condition it violated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckFailure {
    pub selector: String,
    pub condition: String,
}

/// Outcome of a single structural check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// Every applicable element satisfied the check.
    Passed { elements: usize },
    /// At least one element violated the check.
    Failed { failures: Vec<CheckFailure> },
    /// Zero applicable elements; not a failure.
    Skipped { reason: String },
}

/// A named check and its outcome, plus any advisory warnings it emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub outcome: CheckOutcome,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl CheckResult {
    fn new(name: &str, outcome: CheckOutcome) -> Self {
        Self {
            name: name.to_string(),
            outcome,
            warnings: Vec::new(),
        }
    }

    pub fn failed(&self) -> bool {
        matches!(self.outcome, CheckOutcome::Failed { .. })
    }

    fn from_failures(name: &str, applicable: usize, failures: Vec<CheckFailure>) -> Self {
        let outcome = if failures.is_empty() {
            CheckOutcome::Passed {
                elements: applicable,
            }
        } else {
            CheckOutcome::Failed { failures }
        };
        Self::new(name, outcome)
    }

    fn skipped(name: &str, reason: &str) -> Self {
        Self::new(
            name,
            CheckOutcome::Skipped {
                reason: reason.to_string(),
            },
        )
    }
}

/// Run every structural check against a snapshot, in a fixed order.
pub fn run_structural_checks(snapshot: &PageSnapshot) -> Vec<CheckResult> {
    vec![
        check_keyboard_reachability(snapshot),
        check_live_regions(snapshot),
        check_message_announcement(snapshot),
        check_drag_and_drop(snapshot),
        check_landmarks(snapshot),
        check_heading_hierarchy(snapshot),
        check_image_alt(snapshot),
        check_form_labeling(snapshot),
        check_link_text(snapshot),
    ]
}

/// Fail on the first failed check. Every failed check is logged with its full
/// per-element diagnostic before returning, so nothing is hidden by the
/// single error.
pub fn ensure_all_passed(results: &[CheckResult]) -> Result<()> {
    let mut first: Option<AuditError> = None;

    for result in results {
        if let CheckOutcome::Failed { failures } = &result.outcome {
            let details = failures
                .iter()
                .map(|f| format!("{}: {}", f.selector, f.condition))
                .collect::<Vec<_>>()
                .join("\n");
            error!(check = %result.name, "structural check failed:\n{details}");

            if first.is_none() {
                first = Some(AuditError::StructuralCheck {
                    check: result.name.clone(),
                    details,
                });
            }
        }
    }

    match first {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Every interactive descendant of layout content must take focus and show a
/// visible focus indicator while focused.
pub fn check_keyboard_reachability(snapshot: &PageSnapshot) -> CheckResult {
    const NAME: &str = "keyboard-reachability";

    if snapshot.focusables.is_empty() {
        return CheckResult::skipped(NAME, "no interactive elements under layout content");
    }

    let mut failures = Vec::new();
    for probe in &snapshot.focusables {
        if !probe.focusable {
            failures.push(CheckFailure {
                selector: probe.selector.clone(),
                condition: "element cannot receive keyboard focus".to_string(),
            });
        } else if !probe.focus_visible {
            failures.push(CheckFailure {
                selector: probe.selector.clone(),
                condition: "no visible focus indicator (outline and box-shadow are none)"
                    .to_string(),
            });
        }
    }

    CheckResult::from_failures(NAME, snapshot.focusables.len(), failures)
}

/// `aria-live` values must be one of polite, assertive, off.
pub fn check_live_regions(snapshot: &PageSnapshot) -> CheckResult {
    const NAME: &str = "live-regions";

    if snapshot.live_regions.is_empty() {
        return CheckResult::skipped(NAME, "no aria-live regions on page");
    }

    let mut failures = Vec::new();
    for region in &snapshot.live_regions {
        if !matches!(region.value.as_str(), "polite" | "assertive" | "off") {
            failures.push(CheckFailure {
                selector: region.selector.clone(),
                condition: format!(
                    "aria-live value '{}' is not one of polite, assertive, off",
                    region.value
                ),
            });
        }
    }

    CheckResult::from_failures(NAME, snapshot.live_regions.len(), failures)
}

/// Message and alert surfaces must carry an explicit alert role or an
/// `aria-live` attribute so they are announced.
pub fn check_message_announcement(snapshot: &PageSnapshot) -> CheckResult {
    const NAME: &str = "message-announcement";

    if snapshot.messages.is_empty() {
        return CheckResult::skipped(NAME, "no message surfaces on page");
    }

    let mut failures = Vec::new();
    for message in &snapshot.messages {
        let announced =
            message.role.as_deref() == Some("alert") || message.aria_live.is_some();
        if !announced {
            failures.push(CheckFailure {
                selector: message.selector.clone(),
                condition: "message has neither an alert role nor an aria-live attribute"
                    .to_string(),
            });
        }
    }

    CheckResult::from_failures(NAME, snapshot.messages.len(), failures)
}

/// Draggable elements must expose at least one keyboard alternative.
pub fn check_drag_and_drop(snapshot: &PageSnapshot) -> CheckResult {
    const NAME: &str = "drag-and-drop-alternative";

    if snapshot.draggables.is_empty() {
        return CheckResult::skipped(NAME, "no draggable elements on page");
    }

    let mut failures = Vec::new();
    for draggable in &snapshot.draggables {
        if !draggable.has_keyboard_alternative() {
            failures.push(CheckFailure {
                selector: draggable.selector.clone(),
                condition: "no keyboard alternative (aria-grabbed, aria-dropeffect, \
                            tab stop or nested button control)"
                    .to_string(),
            });
        }
    }

    CheckResult::from_failures(NAME, snapshot.draggables.len(), failures)
}

/// Layout-content containers should expose a landmark role or be a native
/// landmark tag. Advisory only: offenders are reported as warnings.
pub fn check_landmarks(snapshot: &PageSnapshot) -> CheckResult {
    const NAME: &str = "landmark-presence";

    if snapshot.layout_regions.is_empty() {
        return CheckResult::skipped(NAME, "no layout-content containers on page");
    }

    let mut result = CheckResult::new(
        NAME,
        CheckOutcome::Passed {
            elements: snapshot.layout_regions.len(),
        },
    );

    for region in &snapshot.layout_regions {
        let has_landmark = region
            .role
            .as_deref()
            .map(|role| LANDMARK_ROLES.contains(&role))
            .unwrap_or(false)
            || LANDMARK_TAGS.contains(&region.tag.as_str());

        if !has_landmark {
            let message = format!(
                "{}: layout-content container <{}> has no landmark role",
                region.selector, region.tag
            );
            warn!(check = NAME, "{message}");
            result.warnings.push(message);
        }
    }

    result
}

/// Exactly one h1, and no heading level may increase by more than one step
/// from the previous heading in document order.
pub fn check_heading_hierarchy(snapshot: &PageSnapshot) -> CheckResult {
    const NAME: &str = "heading-hierarchy";

    if snapshot.headings.is_empty() {
        return CheckResult::skipped(NAME, "no headings on page");
    }

    let mut failures = Vec::new();

    let h1_count = snapshot.headings.iter().filter(|h| h.level == 1).count();
    if h1_count != 1 {
        failures.push(CheckFailure {
            selector: "h1".to_string(),
            condition: format!("expected exactly one h1, found {h1_count}"),
        });
    }

    let mut previous: Option<u8> = None;
    for heading in &snapshot.headings {
        if let Some(prev) = previous {
            if heading.level > prev + 1 {
                failures.push(CheckFailure {
                    selector: heading.selector.clone(),
                    condition: format!(
                        "heading level jumps from h{} to h{}",
                        prev, heading.level
                    ),
                });
            }
        }
        previous = Some(heading.level);
    }

    CheckResult::from_failures(NAME, snapshot.headings.len(), failures)
}

/// Non-decorative images need alt text that is present, longer than two
/// characters and not a bare filename.
pub fn check_image_alt(snapshot: &PageSnapshot) -> CheckResult {
    const NAME: &str = "image-alt-quality";

    if snapshot.images.is_empty() {
        return CheckResult::skipped(NAME, "no images on page");
    }

    let mut failures = Vec::new();
    for image in &snapshot.images {
        if matches!(image.role.as_deref(), Some("presentation") | Some("none")) {
            continue;
        }

        match image.alt.as_deref() {
            None => failures.push(CheckFailure {
                selector: image.selector.clone(),
                condition: "image has no alt attribute".to_string(),
            }),
            Some("") => {} // explicit empty alt marks a decorative image
            Some(alt) => {
                if FILENAME_ALT.is_match(alt) {
                    failures.push(CheckFailure {
                        selector: image.selector.clone(),
                        condition: format!("alt text '{alt}' looks like a filename"),
                    });
                } else if alt.chars().count() <= 2 {
                    failures.push(CheckFailure {
                        selector: image.selector.clone(),
                        condition: format!("alt text '{alt}' is too short to describe the image"),
                    });
                }
            }
        }
    }

    CheckResult::from_failures(NAME, snapshot.images.len(), failures)
}

/// Every visible form control needs an associated label, an aria-label or an
/// aria-labelledby reference.
pub fn check_form_labeling(snapshot: &PageSnapshot) -> CheckResult {
    const NAME: &str = "form-labeling";

    let visible: Vec<_> = snapshot
        .form_controls
        .iter()
        .filter(|control| !control.is_hidden())
        .collect();

    if visible.is_empty() {
        return CheckResult::skipped(NAME, "no visible form controls on page");
    }

    let mut failures = Vec::new();
    for control in &visible {
        let labeled = control.has_label_for
            || non_empty(control.aria_label.as_deref())
            || non_empty(control.aria_labelledby.as_deref());

        if !labeled {
            failures.push(CheckFailure {
                selector: control.selector.clone(),
                condition: "control has no label, aria-label or aria-labelledby".to_string(),
            });
        }
    }

    CheckResult::from_failures(NAME, visible.len(), failures)
}

/// Links need accessible text; generic phrases need disambiguating context
/// from an aria-label or title.
pub fn check_link_text(snapshot: &PageSnapshot) -> CheckResult {
    const NAME: &str = "link-text";

    if snapshot.links.is_empty() {
        return CheckResult::skipped(NAME, "no links on page");
    }

    let mut failures = Vec::new();
    for link in &snapshot.links {
        let visible = link.text.trim();
        let has_context =
            non_empty(link.aria_label.as_deref()) || non_empty(link.title.as_deref());

        if visible.is_empty() && !has_context {
            failures.push(CheckFailure {
                selector: link.selector.clone(),
                condition: "link has no accessible text".to_string(),
            });
            continue;
        }

        let generic = GENERIC_LINK_TEXT
            .iter()
            .any(|phrase| visible.eq_ignore_ascii_case(phrase));
        if generic && !has_context {
            failures.push(CheckFailure {
                selector: link.selector.clone(),
                condition: format!(
                    "generic link text '{visible}' without an aria-label or title for context"
                ),
            });
        }
    }

    CheckResult::from_failures(NAME, snapshot.links.len(), failures)
}

fn non_empty(value: Option<&str>) -> bool {
    value.map(|v| !v.trim().is_empty()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{
        Draggable, FocusProbe, FormControl, Heading, Image, LayoutRegion, Link, LiveRegion,
        Message,
    };
    use test_case::test_case;

    fn heading(selector: &str, level: u8) -> Heading {
        Heading {
            selector: selector.to_string(),
            level,
            text: String::new(),
        }
    }

    fn image(selector: &str, alt: Option<&str>, role: Option<&str>) -> Image {
        Image {
            selector: selector.to_string(),
            src: "/media/example".to_string(),
            alt: alt.map(String::from),
            role: role.map(String::from),
        }
    }

    fn link(text: &str, aria_label: Option<&str>, title: Option<&str>) -> Link {
        Link {
            selector: "a[href='/x']".to_string(),
            href: "/x".to_string(),
            text: text.to_string(),
            aria_label: aria_label.map(String::from),
            title: title.map(String::from),
        }
    }

    fn failures(result: &CheckResult) -> usize {
        match &result.outcome {
            CheckOutcome::Failed { failures } => failures.len(),
            _ => 0,
        }
    }

    #[test]
    fn empty_snapshot_skips_every_check() {
        let results = run_structural_checks(&PageSnapshot::default());
        assert_eq!(results.len(), 9);
        assert!(results
            .iter()
            .all(|r| matches!(r.outcome, CheckOutcome::Skipped { .. })));
        assert!(ensure_all_passed(&results).is_ok());
    }

    #[test]
    fn heading_sequence_without_jumps_passes() {
        let snapshot = PageSnapshot {
            headings: vec![heading("h1", 1), heading("h2", 2), heading("h3", 3)],
            ..Default::default()
        };
        assert!(!check_heading_hierarchy(&snapshot).failed());
    }

    #[test]
    fn heading_level_jump_fails() {
        let snapshot = PageSnapshot {
            headings: vec![heading("h1", 1), heading("h3.title", 3)],
            ..Default::default()
        };
        let result = check_heading_hierarchy(&snapshot);
        assert!(result.failed());
        match &result.outcome {
            CheckOutcome::Failed { failures } => {
                assert_eq!(failures[0].selector, "h3.title");
                assert!(failures[0].condition.contains("h1 to h3"));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn missing_h1_fails_even_when_monotonic() {
        let snapshot = PageSnapshot {
            headings: vec![heading("h2", 2), heading("h2.b", 2), heading("h3", 3)],
            ..Default::default()
        };
        let result = check_heading_hierarchy(&snapshot);
        assert_eq!(failures(&result), 1);
    }

    #[test]
    fn descending_then_single_h1_passes() {
        // h2 -> h1 -> h2: monotonicity only restricts increases
        let snapshot = PageSnapshot {
            headings: vec![heading("h2", 2), heading("h1", 1), heading("h2.b", 2)],
            ..Default::default()
        };
        assert!(!check_heading_hierarchy(&snapshot).failed());
    }

    #[test_case(Some("Company Logo"), None, false ; "descriptive alt passes")]
    #[test_case(Some("photo.jpg"), None, true ; "filename alt fails")]
    #[test_case(Some("ok"), None, true ; "two character alt fails")]
    #[test_case(Some(""), None, false ; "empty alt marks decorative")]
    #[test_case(None, Some("presentation"), false ; "presentation role exempt")]
    #[test_case(None, None, true ; "missing alt fails")]
    fn image_alt_cases(alt: Option<&str>, role: Option<&str>, should_fail: bool) {
        let snapshot = PageSnapshot {
            images: vec![image("img.hero", alt, role)],
            ..Default::default()
        };
        assert_eq!(check_image_alt(&snapshot).failed(), should_fail);
    }

    #[test_case("Annual report 2025", None, None, false ; "descriptive text passes")]
    #[test_case("click here", None, None, true ; "generic text fails")]
    #[test_case("Click Here", None, None, true ; "generic match ignores case")]
    #[test_case("click here", Some("Download annual report"), None, false ; "aria label rescues generic text")]
    #[test_case("read more", None, Some("Full press release"), false ; "title rescues generic text")]
    #[test_case("", None, None, true ; "empty text fails")]
    #[test_case("", Some("Home"), None, false ; "aria label alone passes")]
    fn link_text_cases(
        text: &str,
        aria_label: Option<&str>,
        title: Option<&str>,
        should_fail: bool,
    ) {
        let snapshot = PageSnapshot {
            links: vec![link(text, aria_label, title)],
            ..Default::default()
        };
        assert_eq!(check_link_text(&snapshot).failed(), should_fail);
    }

    #[test]
    fn unlabeled_visible_control_fails_hidden_is_ignored() {
        let labeled = FormControl {
            selector: "input#name".to_string(),
            control_type: Some("text".to_string()),
            id: Some("name".to_string()),
            has_label_for: true,
            aria_label: None,
            aria_labelledby: None,
        };
        let hidden = FormControl {
            selector: "input[name=token]".to_string(),
            control_type: Some("hidden".to_string()),
            id: None,
            has_label_for: false,
            aria_label: None,
            aria_labelledby: None,
        };
        let unlabeled = FormControl {
            selector: "input#search".to_string(),
            control_type: Some("search".to_string()),
            id: Some("search".to_string()),
            has_label_for: false,
            aria_label: None,
            aria_labelledby: None,
        };

        let snapshot = PageSnapshot {
            form_controls: vec![labeled.clone(), hidden.clone()],
            ..Default::default()
        };
        assert!(!check_form_labeling(&snapshot).failed());

        let snapshot = PageSnapshot {
            form_controls: vec![labeled, hidden, unlabeled],
            ..Default::default()
        };
        let result = check_form_labeling(&snapshot);
        assert_eq!(failures(&result), 1);
    }

    #[test]
    fn invalid_live_region_value_fails() {
        let snapshot = PageSnapshot {
            live_regions: vec![
                LiveRegion {
                    selector: "div.status".to_string(),
                    value: "polite".to_string(),
                },
                LiveRegion {
                    selector: "div.bogus".to_string(),
                    value: "loud".to_string(),
                },
            ],
            ..Default::default()
        };
        let result = check_live_regions(&snapshot);
        assert_eq!(failures(&result), 1);
    }

    #[test]
    fn message_needs_alert_role_or_live_attribute() {
        let snapshot = PageSnapshot {
            messages: vec![
                Message {
                    selector: "div.messages--status".to_string(),
                    role: None,
                    aria_live: Some("polite".to_string()),
                },
                Message {
                    selector: "div.alert".to_string(),
                    role: Some("alert".to_string()),
                    aria_live: None,
                },
                Message {
                    selector: "div.messages--silent".to_string(),
                    role: Some("region".to_string()),
                    aria_live: None,
                },
            ],
            ..Default::default()
        };
        let result = check_message_announcement(&snapshot);
        assert_eq!(failures(&result), 1);
    }

    #[test]
    fn draggable_without_alternative_fails() {
        let snapshot = PageSnapshot {
            draggables: vec![
                Draggable {
                    selector: "div.card".to_string(),
                    aria_grabbed: false,
                    aria_dropeffect: false,
                    tab_stop: true,
                    nested_button: false,
                },
                Draggable {
                    selector: "div.tile".to_string(),
                    aria_grabbed: false,
                    aria_dropeffect: false,
                    tab_stop: false,
                    nested_button: false,
                },
            ],
            ..Default::default()
        };
        let result = check_drag_and_drop(&snapshot);
        assert_eq!(failures(&result), 1);
    }

    #[test]
    fn landmark_check_warns_but_never_fails() {
        let snapshot = PageSnapshot {
            layout_regions: vec![
                LayoutRegion {
                    selector: "main".to_string(),
                    role: None,
                    tag: "main".to_string(),
                },
                LayoutRegion {
                    selector: "div.layout".to_string(),
                    role: None,
                    tag: "div".to_string(),
                },
            ],
            ..Default::default()
        };
        let result = check_landmarks(&snapshot);
        assert!(!result.failed());
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("div.layout"));
    }

    #[test]
    fn unfocusable_element_and_missing_indicator_both_reported() {
        let snapshot = PageSnapshot {
            focusables: vec![
                FocusProbe {
                    selector: "a.nav".to_string(),
                    focusable: true,
                    focus_visible: true,
                },
                FocusProbe {
                    selector: "div.fake-button".to_string(),
                    focusable: false,
                    focus_visible: false,
                },
                FocusProbe {
                    selector: "button.flat".to_string(),
                    focusable: true,
                    focus_visible: false,
                },
            ],
            ..Default::default()
        };
        let result = check_keyboard_reachability(&snapshot);
        assert_eq!(failures(&result), 2);
    }

    #[test]
    fn ensure_all_passed_surfaces_first_failure() {
        let snapshot = PageSnapshot {
            headings: vec![heading("h2", 2)],
            images: vec![image("img.raw", None, None)],
            ..Default::default()
        };
        let results = run_structural_checks(&snapshot);
        let err = ensure_all_passed(&results).unwrap_err();
        match err {
            AuditError::StructuralCheck { check, details } => {
                assert_eq!(check, "heading-hierarchy");
                assert!(details.contains("exactly one h1"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
