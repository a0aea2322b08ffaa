//! Cleaning one project root end to end.
//!
//! verify root -> clean manifest -> clean markup files -> emit deployment
//! config. The cleaners only compute; every read and write happens here, and
//! a file is written only when its content changed.

pub mod discovery;

use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::MANIFEST_FILE;
use crate::deploy::{self, EmitResult, Platform};
use crate::error::{DelovableError, DelovableResult, IoContext};
use crate::manifest::ManifestCleaner;
use crate::markup::{MarkupCleaner, RuleHit};
use crate::storage::AtomicFile;

#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub platform: Platform,
    /// Compute the report without writing anything
    pub dry_run: bool,
    /// Clean markup files on the rayon pool
    pub parallel: bool,
    /// Descend into symlinked directories and read symlinked files
    pub follow_links: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            platform: Platform::None,
            dry_run: false,
            parallel: true,
            follow_links: false,
        }
    }
}

#[derive(Debug)]
pub enum ManifestOutcome {
    Missing,
    Unchanged,
    Cleaned { removed_keys: Vec<String> },
    Failed(DelovableError),
}

#[derive(Debug)]
pub enum FileStatus {
    Unchanged,
    Cleaned { hits: Vec<RuleHit> },
    Failed(DelovableError),
}

#[derive(Debug)]
pub struct FileOutcome {
    /// Relative to the project root
    pub path: PathBuf,
    pub status: FileStatus,
}

#[derive(Debug)]
pub struct ProcessReport {
    pub root: PathBuf,
    pub dry_run: bool,
    pub manifest: ManifestOutcome,
    pub files: Vec<FileOutcome>,
    pub deployment: Option<EmitResult>,
}

impl ProcessReport {
    /// Whether anything was (or, in a dry run, would be) written
    pub fn changed(&self) -> bool {
        matches!(self.manifest, ManifestOutcome::Cleaned { .. })
            || self.cleaned_files().next().is_some()
            || self.deployment.as_ref().is_some_and(|d| d.created)
    }

    pub fn cleaned_files(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Cleaned { .. }))
    }

    /// One line per step that was skipped because of an error
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if let ManifestOutcome::Failed(err) = &self.manifest {
            warnings.push(format!("Skipped {}: {}", MANIFEST_FILE, err));
        }

        for file in &self.files {
            if let FileStatus::Failed(err) = &file.status {
                warnings.push(format!("Skipped {}: {}", file.path.display(), err));
            }
        }

        warnings
    }

    /// Human-readable account of what was done, in processing order
    pub fn log_lines(&self) -> Vec<String> {
        let prefix = if self.dry_run { "[dry run] " } else { "" };
        let mut lines = Vec::new();

        match &self.manifest {
            ManifestOutcome::Missing => {
                lines.push(format!("No {} found, skipped manifest cleanup", MANIFEST_FILE));
            }
            ManifestOutcome::Unchanged => {
                lines.push(format!("No vendor metadata found in {}", MANIFEST_FILE));
            }
            ManifestOutcome::Cleaned { removed_keys } => {
                for key in removed_keys {
                    lines.push(format!("{}Removed {} from {}", prefix, key, MANIFEST_FILE));
                }
            }
            ManifestOutcome::Failed(err) => {
                lines.push(format!("Failed to clean {}: {}", MANIFEST_FILE, err));
            }
        }

        for file in &self.files {
            match &file.status {
                FileStatus::Unchanged => {}
                FileStatus::Cleaned { hits } => {
                    let removed: usize = hits.iter().map(|h| h.count).sum();
                    lines.push(format!(
                        "{}Removed {} vendor fragment(s) from {}",
                        prefix,
                        removed,
                        file.path.display()
                    ));
                }
                FileStatus::Failed(err) => {
                    lines.push(format!("Skipped {}: {}", file.path.display(), err));
                }
            }
        }

        lines.push(format!(
            "Scanned {} markup file(s), cleaned {}",
            self.files.len(),
            self.cleaned_files().count()
        ));

        if let Some(deployment) = &self.deployment {
            let file = deployment.platform.config_file().unwrap_or_default();
            if deployment.created {
                lines.push(format!(
                    "{}Created {} for {}",
                    prefix, file, deployment.platform
                ));
            } else {
                lines.push(format!("{} already exists, left unchanged", file));
            }
        }

        lines
    }
}

/// Run the whole pipeline over `root`.
///
/// Only a missing root and deployment-config write failures abort the run;
/// manifest and per-file failures are recorded in the report.
pub fn process_project(
    root: &Path,
    manifest_cleaner: &ManifestCleaner,
    markup_cleaner: &MarkupCleaner,
    options: &ProcessOptions,
) -> DelovableResult<ProcessReport> {
    if !root.is_dir() {
        return Err(DelovableError::ProjectNotFound {
            path: root.to_path_buf(),
        });
    }
    let root = root.canonicalize().at_path(root)?;

    tracing::info!(root = %root.display(), platform = %options.platform, dry_run = options.dry_run, "processing project");

    let manifest = clean_manifest(&root, manifest_cleaner, options.dry_run);
    let files = clean_markup_files(&root, markup_cleaner, options);

    let deployment = match options.platform {
        Platform::None => None,
        platform if options.dry_run => Some(deploy::plan(&root, platform)),
        platform => Some(deploy::emit(&root, platform)?),
    };

    Ok(ProcessReport {
        root,
        dry_run: options.dry_run,
        manifest,
        files,
        deployment,
    })
}

fn clean_manifest(root: &Path, cleaner: &ManifestCleaner, dry_run: bool) -> ManifestOutcome {
    let path = root.join(MANIFEST_FILE);
    if !path.is_file() {
        tracing::debug!(path = %path.display(), "no manifest, skipping");
        return ManifestOutcome::Missing;
    }

    match try_clean_manifest(&path, cleaner, dry_run) {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "manifest cleanup failed");
            ManifestOutcome::Failed(err)
        }
    }
}

fn try_clean_manifest(
    path: &Path,
    cleaner: &ManifestCleaner,
    dry_run: bool,
) -> DelovableResult<ManifestOutcome> {
    let text = fs::read_to_string(path).at_path(path)?;
    let cleanup = cleaner.clean_file(&text, path)?;

    if !cleanup.changed {
        return Ok(ManifestOutcome::Unchanged);
    }

    if !dry_run {
        AtomicFile::new(path)?.write(cleanup.text.as_bytes())?;
        tracing::info!(path = %path.display(), removed = ?cleanup.removed_keys, "updated manifest");
    }

    Ok(ManifestOutcome::Cleaned {
        removed_keys: cleanup.removed_keys,
    })
}

fn clean_markup_files(
    root: &Path,
    cleaner: &MarkupCleaner,
    options: &ProcessOptions,
) -> Vec<FileOutcome> {
    let discovered = discovery::markup_files(root, options.follow_links);
    let relative = |path: &Path| path.strip_prefix(root).unwrap_or(path).to_path_buf();

    let clean_one = |path: &PathBuf| {
        let status = match try_clean_markup(path, cleaner, options.dry_run) {
            Ok(status) => status,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping markup file");
                FileStatus::Failed(err)
            }
        };
        FileOutcome {
            path: relative(path),
            status,
        }
    };

    let mut outcomes: Vec<FileOutcome> = if options.parallel {
        discovered.files.par_iter().map(clean_one).collect()
    } else {
        discovered.files.iter().map(clean_one).collect()
    };

    outcomes.extend(
        discovered
            .failures
            .into_iter()
            .map(|(path, err)| FileOutcome {
                path: relative(&path),
                status: FileStatus::Failed(err),
            }),
    );
    outcomes.sort_by(|a, b| a.path.cmp(&b.path));

    outcomes
}

fn try_clean_markup(
    path: &Path,
    cleaner: &MarkupCleaner,
    dry_run: bool,
) -> DelovableResult<FileStatus> {
    let text = fs::read_to_string(path).at_path(path)?;
    let cleanup = cleaner.clean(&text);

    if !cleanup.changed() {
        return Ok(FileStatus::Unchanged);
    }

    if !dry_run {
        AtomicFile::new(path)?.write(cleanup.text.as_bytes())?;
        tracing::info!(path = %path.display(), removed = cleanup.removed(), "updated markup file");
    }

    Ok(FileStatus::Cleaned { hits: cleanup.hits })
}
