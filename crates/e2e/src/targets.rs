//! Declarative YAML page-target manifests
//!
//! A manifest names the routes under audit plus the viewport/browser matrix
//! they run against and any per-page allow-listed rules. The enumerated
//! targets are configuration: immutable once loaded, identity
//! (path, viewport, browser).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, HarnessResult};

/// A manifest of pages to audit, parsed from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetManifest {
    /// Unique name for this audit group
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Routes to audit
    pub pages: Vec<PageEntry>,

    /// Viewports each page runs under
    #[serde(default = "default_viewports")]
    pub viewports: Vec<ViewportPreset>,

    /// Browsers each page runs under
    #[serde(default = "default_browsers")]
    pub browsers: Vec<Browser>,

    /// Whether this group audits the admin interface. Admin groups require
    /// credentials and use the lenient admin scan policy.
    #[serde(default)]
    pub admin: bool,
}

fn default_viewports() -> Vec<ViewportPreset> {
    vec![ViewportPreset::Desktop]
}

fn default_browsers() -> Vec<Browser> {
    vec![Browser::Chromium]
}

/// One route plus its per-page overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageEntry {
    pub path: String,

    /// Rule ids exempted from failing the compliance assertion for this page.
    #[serde(default)]
    pub allow: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewportPreset {
    Desktop,
    Tablet,
    Mobile,
}

impl ViewportPreset {
    pub fn dimensions(&self) -> Viewport {
        match self {
            ViewportPreset::Desktop => Viewport {
                width: 1200,
                height: 800,
            },
            ViewportPreset::Tablet => Viewport {
                width: 768,
                height: 1024,
            },
            ViewportPreset::Mobile => Viewport {
                width: 375,
                height: 667,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewportPreset::Desktop => "desktop",
            ViewportPreset::Tablet => "tablet",
            ViewportPreset::Mobile => "mobile",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// One enumerated audit unit: a route under a specific viewport and browser.
#[derive(Debug, Clone)]
pub struct PageTarget {
    /// Display name, derived from the identity triple.
    pub name: String,
    pub path: String,
    pub viewport: ViewportPreset,
    pub browser: Browser,
    pub allow: Vec<String>,
    pub admin: bool,
}

impl PageTarget {
    /// Filesystem-safe form of the target name, for artifact files.
    pub fn slug(&self) -> String {
        self.name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect()
    }
}

impl TargetManifest {
    pub fn from_yaml(yaml: &str) -> HarnessResult<Self> {
        let manifest: Self = serde_yaml::from_str(yaml)?;
        if manifest.pages.is_empty() {
            return Err(HarnessError::Manifest(format!(
                "manifest '{}' lists no pages",
                manifest.name
            )));
        }
        Ok(manifest)
    }

    pub fn from_file(path: &Path) -> HarnessResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load every manifest under a directory.
    pub fn load_all(dir: &Path) -> HarnessResult<Vec<Self>> {
        let mut manifests = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            manifests.push(Self::from_file(entry.path())?);
        }

        Ok(manifests)
    }

    /// Expand this manifest into its page × viewport × browser matrix.
    pub fn enumerate(&self) -> Vec<PageTarget> {
        let mut targets = Vec::new();

        for page in &self.pages {
            for viewport in &self.viewports {
                for browser in &self.browsers {
                    targets.push(PageTarget {
                        name: format!(
                            "{} [{}/{}]",
                            page.path,
                            viewport.as_str(),
                            browser.as_str()
                        ),
                        path: page.path.clone(),
                        viewport: *viewport,
                        browser: *browser,
                        allow: page.allow.clone(),
                        admin: self.admin,
                    });
                }
            }
        }

        targets
    }
}

/// Expand every manifest, in order.
pub fn enumerate_all(manifests: &[TargetManifest]) -> Vec<PageTarget> {
    manifests.iter().flat_map(|m| m.enumerate()).collect()
}
