use git2::{build::RepoBuilder, ErrorClass, ErrorCode};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{RepositoryFetcher, RepositoryRef};
use crate::error::RemoteError;

pub const GITHUB_BASE_URL: &str = "https://github.com";
pub const GITHUB_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("delovable/", env!("CARGO_PKG_VERSION"));
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// What the hosting API says about a repository before cloning it.
///
/// Anonymous git over HTTP answers 401 for both private and missing
/// repositories, so the API is the only place the two differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
    Missing,
    /// Rate limited or unexpected status; let the clone decide
    Unknown,
}

impl Visibility {
    /// Interpret a `GET /repos/{owner}/{repo}` response
    pub fn from_response(status: u16, body: &str, rate_limited: bool) -> Self {
        match status {
            200..=299 => {
                let private = serde_json::from_str::<Value>(body)
                    .ok()
                    .and_then(|v| v.get("private").and_then(Value::as_bool))
                    .unwrap_or(false);
                if private {
                    Visibility::Private
                } else {
                    Visibility::Public
                }
            }
            404 => Visibility::Missing,
            403 if rate_limited => Visibility::Unknown,
            401 | 403 => Visibility::Private,
            _ => Visibility::Unknown,
        }
    }
}

/// Fetches repositories with a plain `git clone` of the default branch
#[derive(Debug, Clone)]
pub struct GitFetcher {
    base_url: String,
    api_url: Option<String>,
}

impl GitFetcher {
    pub fn new() -> Self {
        Self::with_base_url(GITHUB_BASE_URL).with_api_url(GITHUB_API_URL)
    }

    /// Clone from somewhere other than github.com (mirrors, local paths).
    /// No API lookup happens unless `with_api_url` is also set.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_url: None,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    /// Source directory when the base is a filesystem path
    fn local_source(&self, repo: &RepositoryRef) -> Option<PathBuf> {
        if self.base_url.contains("://") {
            None
        } else {
            Some(PathBuf::from(repo.clone_url(&self.base_url)))
        }
    }

    fn lookup(&self, api_url: &str, repo: &RepositoryRef) -> Result<Visibility, RemoteError> {
        let url = format!(
            "{}/repos/{}/{}",
            api_url.trim_end_matches('/'),
            repo.owner,
            repo.repo
        );
        let agent = ureq::AgentBuilder::new()
            .timeout(LOOKUP_TIMEOUT)
            .user_agent(USER_AGENT)
            .build();

        let response = match agent
            .get(&url)
            .set("Accept", "application/vnd.github+json")
            .call()
        {
            Ok(response) | Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(err)) => {
                return Err(RemoteError::Network {
                    repo: repo.full_name(),
                    message: err.to_string(),
                });
            }
        };

        let status = response.status();
        let rate_limited = response.header("x-ratelimit-remaining") == Some("0");
        let body = response.into_string().unwrap_or_default();

        let visibility = Visibility::from_response(status, &body, rate_limited);
        tracing::debug!(%url, status, ?visibility, "repository lookup");
        Ok(visibility)
    }
}

impl Default for GitFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryFetcher for GitFetcher {
    fn fetch(&self, repo: &RepositoryRef, dest: &Path) -> Result<PathBuf, RemoteError> {
        if let Some(source) = self.local_source(repo) {
            if !source.exists() {
                return Err(RemoteError::NotFound(repo.full_name()));
            }
        }

        if let Some(api_url) = &self.api_url {
            match self.lookup(api_url, repo)? {
                Visibility::Missing => return Err(RemoteError::NotFound(repo.full_name())),
                Visibility::Private => return Err(RemoteError::Inaccessible(repo.full_name())),
                Visibility::Public | Visibility::Unknown => {}
            }
        }

        let url = repo.clone_url(&self.base_url);
        tracing::info!(%url, dest = %dest.display(), "cloning repository");

        RepoBuilder::new()
            .clone(&url, dest)
            .map_err(|e| classify(repo, &e))?;

        Ok(dest.to_path_buf())
    }
}

/// Sort a libgit2 failure into the categories callers act on
pub fn classify(repo: &RepositoryRef, error: &git2::Error) -> RemoteError {
    let name = repo.full_name();
    let message = error.message().to_string();
    let lowered = message.to_ascii_lowercase();

    match (error.code(), error.class()) {
        (ErrorCode::NotFound, _) => RemoteError::NotFound(name),
        (ErrorCode::Auth, _) => RemoteError::Inaccessible(name),
        // a malformed base URL, retrying will not help
        _ if lowered.contains("unsupported url protocol") => {
            RemoteError::Git(format!("{}: {}", name, message))
        }
        (_, ErrorClass::Http) if lowered.contains("404") => RemoteError::NotFound(name),
        (_, ErrorClass::Http)
            if lowered.contains("401")
                || lowered.contains("403")
                || lowered.contains("authentication") =>
        {
            RemoteError::Inaccessible(name)
        }
        (_, ErrorClass::Http | ErrorClass::Net | ErrorClass::Ssl | ErrorClass::Os) => {
            RemoteError::Network {
                repo: name,
                message,
            }
        }
        _ => RemoteError::Git(format!("{}: {}", name, message)),
    }
}
