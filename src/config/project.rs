use std::fs;
use std::path::{Path, PathBuf};

use super::VendorSignatures;
use crate::error::{ConfigError, DelovableResult};

/// Runtime configuration: the signature set and where it came from
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub signatures: VendorSignatures,
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load a signature set from a TOML file. Missing fields keep the
    /// built-in Lovable values.
    pub fn load(path: impl AsRef<Path>) -> DelovableResult<Self> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let signatures: VendorSignatures =
            toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        signatures.validate()?;

        tracing::debug!(path = %path.display(), marker = %signatures.marker, "loaded vendor signatures");

        Ok(Self {
            signatures,
            path: Some(path.to_path_buf()),
        })
    }

    /// `load` when a path is given, the built-in set otherwise
    pub fn load_or_default(path: Option<&Path>) -> DelovableResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml(&self) -> DelovableResult<String> {
        toml::to_string_pretty(&self.signatures)
            .map_err(|e| ConfigError::Invalid(e.to_string()).into())
    }
}
