use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::deploy::Platform;
use crate::error::DelovableResult;
use crate::remote::RepositoryRef;
use crate::validation::InputValidator;

/// Identifier of a hosted cleanup job, `<owner>-<repo>-<unix millis>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(repo: &RepositoryRef, at: DateTime<Utc>) -> Self {
        Self(format!("{}-{}-{}", repo.owner, repo.repo, at.timestamp_millis()))
    }

    /// Validate an id that came from outside before it is used as a path
    pub fn parse(value: &str) -> DelovableResult<Self> {
        InputValidator::validate_identifier("job id", value)?;
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata stored next to a job's archive. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub owner: String,
    pub repo: String,
    pub platform: Platform,
    pub archive_sha256: String,
    pub logs: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn new(
        repo: &RepositoryRef,
        platform: Platform,
        archive: &[u8],
        logs: Vec<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: JobId::new(repo, created_at),
            owner: repo.owner.clone(),
            repo: repo.repo.clone(),
            platform,
            archive_sha256: archive_digest(archive),
            logs,
            created_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, retention: chrono::Duration) -> bool {
        now - self.created_at > retention
    }
}

/// Lower-case hex SHA-256 of an archive
pub fn archive_digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_job_id_format() {
        let repo = RepositoryRef::parse("acme/landing").unwrap();
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();

        let id = JobId::new(&repo, at);
        assert_eq!(id.as_str(), "acme-landing-1700000000123");
        assert_eq!(JobId::parse(id.as_str()).unwrap(), id);
    }

    #[test]
    fn test_job_id_rejects_paths() {
        assert!(JobId::parse("../etc").is_err());
        assert!(JobId::parse("a/b").is_err());
        assert!(JobId::parse("..").is_err());
        assert!(JobId::parse("").is_err());
    }

    #[test]
    fn test_record_expiry() {
        let repo = RepositoryRef::parse("acme/landing").unwrap();
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let record = JobRecord::new(&repo, Platform::Vercel, b"zip", vec![], created);

        let retention = chrono::Duration::hours(24);
        assert!(!record.is_expired(created + chrono::Duration::hours(23), retention));
        assert!(record.is_expired(created + chrono::Duration::hours(25), retention));
    }

    #[test]
    fn test_archive_digest() {
        assert_eq!(
            archive_digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
