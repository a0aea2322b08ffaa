//! Hosted cleanup jobs: fetch a repository, clean it, package the result
//! and keep it around for download.

pub mod job;

pub use job::{JobId, JobRecord};

use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::deploy::Platform;
use crate::error::{DelovableError, DelovableResult, IoContext, RemoteError};
use crate::process::ProcessOptions;
use crate::remote::{RepositoryFetcher, RepositoryRef};
use crate::storage::JobStore;
use crate::Delovable;

/// Turns a cleaned project directory into archive bytes
pub trait Packager: Send + Sync {
    fn package(&self, dir: &Path) -> DelovableResult<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRepository,
    InvalidPlatform,
    NotFound,
    Inaccessible,
    Network,
    ProcessingFailed,
}

impl From<&RemoteError> for ErrorCode {
    fn from(error: &RemoteError) -> Self {
        match error {
            RemoteError::InvalidUrl(_) | RemoteError::UnsupportedHost(_) => {
                ErrorCode::InvalidRepository
            }
            RemoteError::NotFound(_) => ErrorCode::NotFound,
            RemoteError::Inaccessible(_) => ErrorCode::Inaccessible,
            RemoteError::Network { .. } => ErrorCode::Network,
            RemoteError::Git(_) => ErrorCode::ProcessingFailed,
        }
    }
}

/// Outcome of one hosted job, shaped for JSON clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<JobId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub message: String,
    pub logs: Vec<String>,
}

impl ProcessResult {
    fn failure(code: ErrorCode, error: impl ToString, logs: Vec<String>) -> Self {
        let message = match code {
            ErrorCode::InvalidRepository => "Invalid repository URL",
            ErrorCode::InvalidPlatform => "Unsupported deployment platform",
            ErrorCode::NotFound => "Repository not found",
            ErrorCode::Inaccessible => "Repository is private or inaccessible",
            ErrorCode::Network => "Network error while fetching the repository, try again",
            ErrorCode::ProcessingFailed => "Failed to process the repository",
        };

        Self {
            success: false,
            file_id: None,
            code: Some(code),
            error: Some(error.to_string()),
            message: message.to_string(),
            logs,
        }
    }
}

/// A finished archive ready to hand to a client
#[derive(Debug, Clone)]
pub struct Download {
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub struct HostedPipeline {
    delovable: Delovable,
    fetcher: Box<dyn RepositoryFetcher>,
    packager: Box<dyn Packager>,
    store: Box<dyn JobStore>,
    workdir: Option<PathBuf>,
}

impl HostedPipeline {
    pub fn new(
        delovable: Delovable,
        fetcher: impl RepositoryFetcher + 'static,
        packager: impl Packager + 'static,
        store: impl JobStore + 'static,
    ) -> Self {
        Self {
            delovable,
            fetcher: Box::new(fetcher),
            packager: Box::new(packager),
            store: Box::new(store),
            workdir: None,
        }
    }

    /// Check repositories out below `dir` instead of the system temp dir
    pub fn with_workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    /// Run one job. Every failure is folded into the returned result.
    ///
    /// Expired jobs are purged first; a failed purge only logs.
    pub fn process_repository(&self, input: &str, platform: &str) -> ProcessResult {
        match self.store.purge_expired() {
            Ok(0) => {}
            Ok(removed) => tracing::info!(removed, "purged expired jobs"),
            Err(e) => tracing::warn!(error = %e, "could not purge expired jobs"),
        }

        let platform: Platform = match platform.parse() {
            Ok(platform) => platform,
            Err(e) => return ProcessResult::failure(ErrorCode::InvalidPlatform, e, vec![]),
        };

        let repo = match RepositoryRef::parse(input) {
            Ok(repo) => repo,
            Err(e) => return ProcessResult::failure(ErrorCode::InvalidRepository, e, vec![]),
        };

        match self.run(&repo, platform) {
            Ok((id, logs)) => {
                tracing::info!(job = %id, repo = %repo, "job finished");
                ProcessResult {
                    success: true,
                    file_id: Some(id),
                    code: None,
                    error: None,
                    message: format!("Cleaned {}", repo),
                    logs,
                }
            }
            Err(DelovableError::Remote(remote)) => {
                tracing::warn!(repo = %repo, error = %remote, "fetch failed");
                ProcessResult::failure(ErrorCode::from(&remote), remote, vec![])
            }
            Err(e) => {
                tracing::error!(repo = %repo, error = %e, "job failed");
                ProcessResult::failure(ErrorCode::ProcessingFailed, e, vec![])
            }
        }
    }

    fn run(&self, repo: &RepositoryRef, platform: Platform) -> DelovableResult<(JobId, Vec<String>)> {
        let builder = {
            let mut builder = tempfile::Builder::new();
            builder.prefix("delovable-");
            builder
        };
        let scratch = match &self.workdir {
            Some(dir) => {
                fs::create_dir_all(dir).at_path(dir)?;
                builder.tempdir_in(dir).at_path(dir)?
            }
            None => builder.tempdir().at_path(std::env::temp_dir())?,
        };

        let checkout = self.fetcher.fetch(repo, &scratch.path().join(&repo.repo))?;

        let options = ProcessOptions {
            platform,
            ..ProcessOptions::default()
        };
        let report = self.delovable.process(&checkout, &options)?;

        // archives carry the working tree only
        let git_dir = checkout.join(".git");
        if git_dir.is_dir() {
            fs::remove_dir_all(&git_dir).at_path(&git_dir)?;
        }

        let archive = self.packager.package(&checkout)?;
        let mut logs = report.log_lines();
        logs.extend(report.warnings());

        let record = JobRecord::new(repo, platform, &archive, logs.clone(), Utc::now());
        self.store.put(&record, &archive)?;

        Ok((record.id, logs))
    }

    /// Archive of a stored job. Unknown and expired ids are `JobNotFound`.
    pub fn download(&self, id: &str) -> DelovableResult<Download> {
        let id = JobId::parse(id)?;
        let job = self
            .store
            .get(&id)?
            .ok_or_else(|| DelovableError::JobNotFound(id.to_string()))?;

        Ok(Download {
            filename: format!("delovable-{}.zip", id),
            bytes: job.archive,
        })
    }
}
