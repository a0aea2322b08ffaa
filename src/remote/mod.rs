//! Locating and fetching GitHub repositories.

pub mod git;

pub use git::GitFetcher;

use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::RemoteError;
use crate::validation::InputValidator;

const GITHUB_HOSTS: &[&str] = &["github.com", "www.github.com"];

/// Owner and name of a GitHub repository
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryRef {
    pub owner: String,
    pub repo: String,
}

impl RepositoryRef {
    /// True when `input` should be treated as a remote location rather than
    /// a local path
    pub fn is_url(input: &str) -> bool {
        let input = input.trim_start();
        input.starts_with("https://") || input.starts_with("http://")
    }

    /// Accepts `owner/repo`, `github.com/owner/repo` and
    /// `https://github.com/owner/repo[.git][/tree/...]`.
    pub fn parse(input: &str) -> Result<Self, RemoteError> {
        let input = input.trim();
        InputValidator::validate_repository_input(input)
            .map_err(|e| RemoteError::InvalidUrl(e.to_string()))?;

        let segments: Vec<String> = if Self::is_url(input) {
            let url = Url::parse(input)
                .map_err(|e| RemoteError::InvalidUrl(format!("{}: {}", input, e)))?;
            let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
            if !GITHUB_HOSTS.contains(&host.as_str()) {
                return Err(RemoteError::UnsupportedHost(host));
            }
            url.path_segments()
                .map(|segments| {
                    segments
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default()
        } else {
            let mut segments: Vec<String> = input
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if segments
                .first()
                .is_some_and(|s| GITHUB_HOSTS.contains(&s.to_ascii_lowercase().as_str()))
            {
                segments.remove(0);
            }
            segments
        };

        if segments.len() < 2 {
            return Err(RemoteError::InvalidUrl(format!(
                "{} (expected owner/repo or https://github.com/owner/repo)",
                input
            )));
        }

        let owner = segments[0].clone();
        let repo = segments[1].trim_end_matches(".git").to_string();

        for (kind, value) in [("owner", &owner), ("repository", &repo)] {
            InputValidator::validate_identifier(kind, value)
                .map_err(|e| RemoteError::InvalidUrl(e.to_string()))?;
        }

        Ok(Self { owner, repo })
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Clone URL below `base`, e.g. `https://github.com`
    pub fn clone_url(&self, base: &str) -> String {
        format!("{}/{}/{}.git", base.trim_end_matches('/'), self.owner, self.repo)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Repository acquisition. Implementations place a checked-out tree at
/// `dest` and return the directory holding it.
pub trait RepositoryFetcher: Send + Sync {
    fn fetch(&self, repo: &RepositoryRef, dest: &Path) -> Result<PathBuf, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        let expected = RepositoryRef {
            owner: "acme".to_string(),
            repo: "landing".to_string(),
        };

        for input in [
            "acme/landing",
            "github.com/acme/landing",
            "https://github.com/acme/landing",
            "https://github.com/acme/landing.git",
            "https://www.github.com/acme/landing/tree/main/src",
            "  https://github.com/acme/landing/  ",
        ] {
            assert_eq!(RepositoryRef::parse(input).unwrap(), expected, "input: {}", input);
        }
    }

    #[test]
    fn test_parse_rejects() {
        assert!(matches!(
            RepositoryRef::parse("https://gitlab.com/acme/landing"),
            Err(RemoteError::UnsupportedHost(_))
        ));
        assert!(matches!(
            RepositoryRef::parse("https://github.com/acme"),
            Err(RemoteError::InvalidUrl(_))
        ));
        assert!(matches!(
            RepositoryRef::parse("acme/../etc"),
            Err(RemoteError::InvalidUrl(_))
        ));
        assert!(matches!(
            RepositoryRef::parse("acme landing"),
            Err(RemoteError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_is_url() {
        assert!(RepositoryRef::is_url("https://github.com/acme/landing"));
        assert!(!RepositoryRef::is_url("./acme/landing"));
        assert!(!RepositoryRef::is_url("acme/landing"));
    }

    #[test]
    fn test_clone_url() {
        let repo = RepositoryRef::parse("acme/landing").unwrap();
        assert_eq!(
            repo.clone_url("https://github.com/"),
            "https://github.com/acme/landing.git"
        );
        assert_eq!(repo.to_string(), "acme/landing");
    }
}
