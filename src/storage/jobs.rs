use chrono::{DateTime, Duration, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::AtomicFile;
use crate::error::{DelovableError, DelovableResult, IoContext};
use crate::hosted::job::{archive_digest, JobId, JobRecord};

const RECORD_FILE: &str = "record.json";
const ARCHIVE_FILE: &str = "archive.zip";

/// Jobs stay downloadable for this long after they are created
pub const DEFAULT_RETENTION_HOURS: i64 = 24;

/// A job read back from storage
#[derive(Debug, Clone)]
pub struct StoredJob {
    pub record: JobRecord,
    pub archive: Vec<u8>,
}

/// Persistence for finished jobs. Records are immutable once stored.
pub trait JobStore: Send + Sync {
    /// Fails with `JobExists` when the id is already taken
    fn put(&self, record: &JobRecord, archive: &[u8]) -> DelovableResult<()>;

    /// `None` for unknown and expired jobs
    fn get(&self, id: &JobId) -> DelovableResult<Option<StoredJob>>;

    /// Delete every job older than the retention window. Returns how many
    /// were removed.
    fn purge_expired(&self) -> DelovableResult<usize>;
}

/// One directory per job under a root, holding `record.json` and
/// `archive.zip`
#[derive(Debug, Clone)]
pub struct LocalJobStore {
    root: PathBuf,
    retention: Duration,
}

impl LocalJobStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            retention: Duration::hours(DEFAULT_RETENTION_HOURS),
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    fn job_dir(&self, id: &JobId) -> PathBuf {
        self.root.join(id.as_str())
    }

    fn get_at(&self, id: &JobId, now: DateTime<Utc>) -> DelovableResult<Option<StoredJob>> {
        let dir = self.job_dir(id);
        let record_path = dir.join(RECORD_FILE);
        if !record_path.is_file() {
            return Ok(None);
        }

        let content = AtomicFile::new(&record_path)?.read_to_string()?;
        let record: JobRecord = serde_json::from_str(&content).map_err(|e| {
            DelovableError::InvalidInput(format!("Corrupt job record {}: {}", id, e))
        })?;

        if record.is_expired(now, self.retention) {
            tracing::debug!(job = %id, created_at = %record.created_at, "job expired");
            return Ok(None);
        }

        let archive_path = dir.join(ARCHIVE_FILE);
        let archive = fs::read(&archive_path).at_path(&archive_path)?;
        if archive_digest(&archive) != record.archive_sha256 {
            return Err(DelovableError::InvalidInput(format!(
                "Archive checksum mismatch for job {}",
                id
            )));
        }

        Ok(Some(StoredJob { record, archive }))
    }

    fn purge_expired_at(&self, now: DateTime<Utc>) -> DelovableResult<usize> {
        if !self.root.is_dir() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in fs::read_dir(&self.root).at_path(&self.root)? {
            let dir = entry.at_path(&self.root)?.path();
            let record_path = dir.join(RECORD_FILE);
            let Ok(content) = fs::read_to_string(&record_path) else {
                continue;
            };
            let Ok(record) = serde_json::from_str::<JobRecord>(&content) else {
                continue;
            };

            if record.is_expired(now, self.retention) {
                fs::remove_dir_all(&dir).at_path(&dir)?;
                tracing::debug!(job = %record.id, "purged expired job");
                removed += 1;
            }
        }

        Ok(removed)
    }
}

impl JobStore for LocalJobStore {
    fn put(&self, record: &JobRecord, archive: &[u8]) -> DelovableResult<()> {
        fs::create_dir_all(&self.root).at_path(&self.root)?;

        // create_dir is the claim on the id
        let dir = self.job_dir(&record.id);
        match fs::create_dir(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(DelovableError::JobExists(record.id.to_string()));
            }
            Err(e) => return Err(DelovableError::io(dir, e)),
        }

        AtomicFile::new(dir.join(ARCHIVE_FILE))?.write(archive)?;

        // record last: a job without one reads as absent
        let content = serde_json::to_string_pretty(record)
            .map_err(|e| DelovableError::InvalidInput(e.to_string()))?;
        AtomicFile::new(dir.join(RECORD_FILE))?.write(content.as_bytes())?;

        tracing::info!(job = %record.id, bytes = archive.len(), "stored job");
        Ok(())
    }

    fn get(&self, id: &JobId) -> DelovableResult<Option<StoredJob>> {
        self.get_at(id, Utc::now())
    }

    fn purge_expired(&self) -> DelovableResult<usize> {
        self.purge_expired_at(Utc::now())
    }
}
