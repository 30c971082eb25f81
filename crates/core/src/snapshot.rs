//! Page snapshot model
//!
//! The structured DOM facts the browser bridge extracts from a live page for
//! the structural checks: headings, media, links, form controls, announcement
//! surfaces, drag handles, layout regions and focus probes. Computed fresh per
//! audit, never cached.

use serde::{Deserialize, Serialize};

/// Marker attribute identifying layout-content containers, the primary
/// structural-check scope.
pub const LAYOUT_CONTENT_SELECTOR: &str = "[data-layout-content]";

/// Message and alert surfaces that must be announced to assistive technology.
pub const MESSAGE_SELECTOR: &str = ".messages, .alert, [role=\"alert\"]";

/// Interactive descendants probed by the keyboard-reachability check, scoped
/// under the layout-content containers by the extraction script.
pub const INTERACTIVE_DESCENDANTS: &[&str] =
    &["a", "button", "input", "select", "textarea", "[tabindex=\"0\"]"];

/// Compound selector matching every interactive descendant of layout content.
pub fn focusable_selector() -> String {
    INTERACTIVE_DESCENDANTS
        .iter()
        .map(|tag| format!("{LAYOUT_CONTENT_SELECTOR} {tag}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Everything the structural checks need to observe about one loaded page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub headings: Vec<Heading>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub form_controls: Vec<FormControl>,
    #[serde(default)]
    pub live_regions: Vec<LiveRegion>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub draggables: Vec<Draggable>,
    #[serde(default)]
    pub layout_regions: Vec<LayoutRegion>,
    #[serde(default)]
    pub focusables: Vec<FocusProbe>,
}

/// A heading element and its level in document order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heading {
    pub selector: String,
    pub level: u8,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub selector: String,
    #[serde(default)]
    pub src: String,
    /// `None` means the attribute is absent, distinct from an empty string.
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub selector: String,
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub aria_label: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormControl {
    pub selector: String,
    /// The `type` attribute for inputs; `None` for selects and textareas.
    #[serde(default)]
    pub control_type: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    /// Whether a `<label for=id>` exists for this control's id.
    #[serde(default)]
    pub has_label_for: bool,
    #[serde(default)]
    pub aria_label: Option<String>,
    #[serde(default)]
    pub aria_labelledby: Option<String>,
}

impl FormControl {
    pub fn is_hidden(&self) -> bool {
        self.control_type.as_deref() == Some("hidden")
    }
}

/// An element carrying an `aria-live` attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveRegion {
    pub selector: String,
    #[serde(default)]
    pub value: String,
}

/// A message or alert surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub selector: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub aria_live: Option<String>,
}

/// A draggable element and the keyboard alternatives it exposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draggable {
    pub selector: String,
    #[serde(default)]
    pub aria_grabbed: bool,
    #[serde(default)]
    pub aria_dropeffect: bool,
    #[serde(default)]
    pub tab_stop: bool,
    #[serde(default)]
    pub nested_button: bool,
}

impl Draggable {
    pub fn has_keyboard_alternative(&self) -> bool {
        self.aria_grabbed || self.aria_dropeffect || self.tab_stop || self.nested_button
    }
}

/// A layout-content container and its landmark exposure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRegion {
    pub selector: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub tag: String,
}

/// Result of focusing one interactive element in-page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusProbe {
    pub selector: String,
    /// The element became `document.activeElement` after `focus()`.
    #[serde(default)]
    pub focusable: bool,
    /// A non-`none` outline or box-shadow was present while focused.
    #[serde(default)]
    pub focus_visible: bool,
}
