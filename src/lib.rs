pub mod config;
pub mod deploy;
pub mod error;
pub mod hosted;
pub mod manifest;
pub mod markup;
pub mod process;
pub mod remote;
pub mod storage;
pub mod validation;

use std::path::Path;

use config::{Config, VendorSignatures};
use error::DelovableResult;
use manifest::{ManifestCleaner, ManifestCleanup};
use markup::{MarkupCleaner, MarkupCleanup};
use process::{ProcessOptions, ProcessReport};

/// Cleaners built once from a signature set and shared by every run
#[derive(Debug, Clone)]
pub struct Delovable {
    config: Config,
    manifest: ManifestCleaner,
    markup: MarkupCleaner,
}

impl Delovable {
    pub fn new(config: Config) -> DelovableResult<Self> {
        config.signatures.validate()?;
        let manifest = ManifestCleaner::new(&config.signatures);
        let markup = MarkupCleaner::new(&config.signatures)?;

        Ok(Self {
            config,
            manifest,
            markup,
        })
    }

    pub fn with_signatures(signatures: VendorSignatures) -> DelovableResult<Self> {
        Self::new(Config {
            signatures,
            path: None,
        })
    }

    pub fn signatures(&self) -> &VendorSignatures {
        &self.config.signatures
    }

    pub fn clean_manifest(&self, text: &str) -> DelovableResult<ManifestCleanup> {
        self.manifest.clean(text)
    }

    pub fn clean_markup<'a>(&self, text: &'a str) -> MarkupCleanup<'a> {
        self.markup.clean(text)
    }

    pub fn process(
        &self,
        project_root: impl AsRef<Path>,
        options: &ProcessOptions,
    ) -> DelovableResult<ProcessReport> {
        process::process_project(project_root.as_ref(), &self.manifest, &self.markup, options)
    }
}

impl Default for Delovable {
    fn default() -> Self {
        Self {
            config: Config::default(),
            manifest: ManifestCleaner::default(),
            markup: MarkupCleaner::default(),
        }
    }
}
