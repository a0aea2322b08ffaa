//! Removal of vendor entries from `package.json`.
//!
//! The cleaner works on text in and text out. A document with nothing to
//! remove comes back untouched, byte for byte; a document that loses keys is
//! re-emitted with two-space indentation and insertion order preserved, so a
//! second pass over the output finds nothing and changes nothing.

use serde_json::{Map, Value};
use std::path::Path;

use crate::config::{VendorSignatures, MANIFEST_FILE};
use crate::error::{DelovableError, DelovableResult};

/// Outcome of cleaning one manifest document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestCleanup {
    pub text: String,
    pub changed: bool,
    pub removed_keys: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ManifestCleaner {
    dependencies: Vec<String>,
    dependency_sections: Vec<String>,
    scripts: Vec<String>,
    config_field: String,
}

impl ManifestCleaner {
    pub fn new(signatures: &VendorSignatures) -> Self {
        Self {
            dependencies: signatures.dependencies.clone(),
            dependency_sections: signatures.dependency_sections.clone(),
            scripts: signatures.scripts.clone(),
            config_field: signatures.config_field.clone(),
        }
    }

    pub fn clean(&self, text: &str) -> DelovableResult<ManifestCleanup> {
        self.clean_file(text, Path::new(MANIFEST_FILE))
    }

    /// Same as `clean`, naming `path` in any `MalformedManifest` error
    pub fn clean_file(&self, text: &str, path: &Path) -> DelovableResult<ManifestCleanup> {
        let malformed = |message: String| DelovableError::MalformedManifest {
            path: path.to_path_buf(),
            message,
        };

        let mut document: Value =
            serde_json::from_str(text).map_err(|e| malformed(e.to_string()))?;
        let root = document
            .as_object_mut()
            .ok_or_else(|| malformed("top-level value is not an object".to_string()))?;

        let mut removed_keys = Vec::new();

        for section in &self.dependency_sections {
            if let Some(Value::Object(entries)) = root.get_mut(section) {
                remove_listed(entries, &self.dependencies, &mut removed_keys);
            }
        }

        if let Some(Value::Object(entries)) = root.get_mut("scripts") {
            remove_listed(entries, &self.scripts, &mut removed_keys);
        }

        if !self.config_field.is_empty() && root.shift_remove(&self.config_field).is_some() {
            tracing::debug!(field = %self.config_field, "removed vendor configuration field");
            removed_keys.push(self.config_field.clone());
        }

        if removed_keys.is_empty() {
            return Ok(ManifestCleanup {
                text: text.to_string(),
                changed: false,
                removed_keys,
            });
        }

        let mut text =
            serde_json::to_string_pretty(&document).map_err(|e| malformed(e.to_string()))?;
        text.push('\n');

        Ok(ManifestCleanup {
            text,
            changed: true,
            removed_keys,
        })
    }
}

impl Default for ManifestCleaner {
    fn default() -> Self {
        Self::new(&VendorSignatures::default())
    }
}

fn remove_listed(entries: &mut Map<String, Value>, names: &[String], removed: &mut Vec<String>) {
    for name in names {
        // shift_remove keeps the relative order of the remaining keys
        if entries.shift_remove(name).is_some() {
            tracing::debug!(key = %name, "removed vendor manifest entry");
            if !removed.contains(name) {
                removed.push(name.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_targeted_removal() -> anyhow::Result<()> {
        let cleaner = ManifestCleaner::default();
        let input = r#"{"dependencies": {"react": "^18.0.0", "lovable-analytics": "^1.0.0"}}"#;

        let cleanup = cleaner.clean(input)?;
        assert!(cleanup.changed);
        assert_eq!(cleanup.removed_keys, vec!["lovable-analytics".to_string()]);

        let parsed: Value = serde_json::from_str(&cleanup.text)?;
        assert_eq!(parsed["dependencies"], serde_json::json!({"react": "^18.0.0"}));

        Ok(())
    }

    #[test]
    fn test_untouched_document_is_byte_identical() -> anyhow::Result<()> {
        let cleaner = ManifestCleaner::default();
        // odd spacing on purpose: it must survive
        let input = "{\n    \"name\":\"site\",\n  \"dependencies\": { \"react\": \"^18.0.0\" }\n}";

        let cleanup = cleaner.clean(input)?;
        assert!(!cleanup.changed);
        assert!(cleanup.removed_keys.is_empty());
        assert_eq!(cleanup.text, input);

        Ok(())
    }

    #[test]
    fn test_preserves_key_order() -> anyhow::Result<()> {
        let cleaner = ManifestCleaner::default();
        let input = r#"{
  "name": "site",
  "scripts": {
    "dev": "vite",
    "lovable-build": "lovable build",
    "build": "vite build",
    "lint": "eslint ."
  },
  "lovable": { "projectId": "abc" },
  "dependencies": {
    "zod": "^3.0.0",
    "@lovable/core": "^1.0.0",
    "axios": "^1.0.0",
    "react": "^18.0.0"
  },
  "devDependencies": {
    "lovable-tagger": "^1.1.7",
    "vite": "^5.0.0"
  }
}"#;

        let cleanup = cleaner.clean(input)?;
        let expected = r#"{
  "name": "site",
  "scripts": {
    "dev": "vite",
    "build": "vite build",
    "lint": "eslint ."
  },
  "dependencies": {
    "zod": "^3.0.0",
    "axios": "^1.0.0",
    "react": "^18.0.0"
  },
  "devDependencies": {
    "vite": "^5.0.0"
  }
}
"#;
        assert_eq!(cleanup.text, expected);
        assert_eq!(
            cleanup.removed_keys,
            vec!["@lovable/core", "lovable-tagger", "lovable-build", "lovable"]
        );

        Ok(())
    }

    #[test]
    fn test_second_pass_is_noop() -> anyhow::Result<()> {
        let cleaner = ManifestCleaner::default();
        let input = r#"{"scripts": {"lovable-start": "x", "start": "vite"}, "lovable": true}"#;

        let first = cleaner.clean(input)?;
        let second = cleaner.clean(&first.text)?;
        assert!(!second.changed);
        assert_eq!(second.text, first.text);

        Ok(())
    }

    #[test]
    fn test_malformed_manifest() {
        let cleaner = ManifestCleaner::default();
        let result = cleaner.clean("{\"dependencies\": ");
        assert!(matches!(result, Err(DelovableError::MalformedManifest { .. })));

        let result = cleaner.clean("[1, 2, 3]");
        assert!(matches!(result, Err(DelovableError::MalformedManifest { .. })));
    }

    #[test]
    fn test_ignores_non_object_sections() -> anyhow::Result<()> {
        let cleaner = ManifestCleaner::default();
        let input = r#"{"dependencies": null, "scripts": ["lovable-build"]}"#;

        let cleanup = cleaner.clean(input)?;
        assert!(!cleanup.changed);
        assert_eq!(cleanup.text, input);

        Ok(())
    }

    #[test]
    fn test_alternative_signatures() -> anyhow::Result<()> {
        let signatures = VendorSignatures {
            dependencies: vec!["acme-tracker".to_string()],
            config_field: "acme".to_string(),
            ..VendorSignatures::default()
        };
        let cleaner = ManifestCleaner::new(&signatures);
        let input = r#"{"dependencies": {"acme-tracker": "1", "lovable-tagger": "1"}, "acme": {}}"#;

        let cleanup = cleaner.clean(input)?;
        assert_eq!(cleanup.removed_keys, vec!["acme-tracker", "acme"]);
        assert!(cleanup.text.contains("lovable-tagger"));

        Ok(())
    }
}
