pub mod project;

pub use project::Config;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, DelovableResult};

/// Well-known manifest file at the project root
pub const MANIFEST_FILE: &str = "package.json";

/// Directory names never descended into when looking for markup
pub const EXCLUDED_DIRS: &[&str] = &["node_modules", "dist", "build", ".git"];

/// Names and shapes identifying vendor-owned artifacts.
///
/// The set is plain data: the cleaners compile what they need from it, so an
/// alternative vendor can be described without touching any algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorSignatures {
    pub version: String,
    /// Token identifying the vendor in markup (`src`, `name`, `property` values)
    pub marker: String,
    pub dependencies: Vec<String>,
    /// Manifest sections searched for `dependencies`
    pub dependency_sections: Vec<String>,
    pub scripts: Vec<String>,
    /// Top-level manifest field reserved for vendor configuration
    pub config_field: String,
    /// Boolean/data attribute flagging a vendor script element
    pub script_attribute: String,
    /// Initialization call found inside inline vendor scripts
    pub init_call: String,
}

impl Default for VendorSignatures {
    fn default() -> Self {
        Self::lovable()
    }
}

impl VendorSignatures {
    pub fn lovable() -> Self {
        Self {
            version: "0.1.0".to_string(),
            marker: "lovable".to_string(),
            dependencies: strings(&[
                "lovable-tagger",
                "lovable-analytics",
                "@lovable/core",
                "@lovable/tracking",
                "@lovable/utils",
            ]),
            dependency_sections: strings(&["dependencies", "devDependencies"]),
            scripts: strings(&["lovable-deploy", "lovable-build", "lovable-start"]),
            config_field: "lovable".to_string(),
            script_attribute: "data-lovable".to_string(),
            init_call: "lovable.init".to_string(),
        }
    }

    pub fn validate(&self) -> DelovableResult<()> {
        if self.marker.is_empty() || self.marker.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(format!(
                "marker must be a single non-empty token, got {:?}",
                self.marker
            ))
            .into());
        }

        if self.script_attribute.is_empty() || self.init_call.is_empty() {
            return Err(ConfigError::Invalid(
                "script_attribute and init_call must not be empty".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
