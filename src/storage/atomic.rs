use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{DelovableError, DelovableResult, IoContext};

/// Write-if-changed target. Content goes to a sibling temp file first and is
/// renamed over the target, so readers never see a half-written file.
pub struct AtomicFile {
    path: PathBuf,
    temp_path: PathBuf,
}

impl AtomicFile {
    pub fn new<P: AsRef<Path>>(path: P) -> DelovableResult<Self> {
        let path = path.as_ref().to_path_buf();
        let temp_path = Self::temp_path(&path)?;

        Ok(Self { path, temp_path })
    }

    /// Generate a temporary file path for atomic operations
    fn temp_path(path: &Path) -> DelovableResult<PathBuf> {
        let file_name = path
            .file_name()
            .ok_or_else(|| DelovableError::InvalidInput(format!("Invalid file path: {:?}", path)))?;

        let temp_name = format!(
            ".{}.tmp.{}",
            file_name.to_string_lossy(),
            std::process::id()
        );

        Ok(path.with_file_name(temp_name))
    }

    /// Atomically write content to file, keeping the target's permissions
    pub fn write(&self, content: &[u8]) -> DelovableResult<()> {
        let result = self.write_temp(content).and_then(|_| {
            fs::rename(&self.temp_path, &self.path).at_path(&self.path)
        });

        if result.is_err() && self.temp_path.exists() {
            let _ = fs::remove_file(&self.temp_path);
        }

        result
    }

    fn write_temp(&self, content: &[u8]) -> DelovableResult<()> {
        let mut temp_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.temp_path)
            .at_path(&self.temp_path)?;

        temp_file.write_all(content).at_path(&self.temp_path)?;
        temp_file.sync_all().at_path(&self.temp_path)?;

        if let Ok(metadata) = fs::metadata(&self.path) {
            fs::set_permissions(&self.temp_path, metadata.permissions())
                .at_path(&self.temp_path)?;
        }

        Ok(())
    }

    pub fn read_to_string(&self) -> DelovableResult<String> {
        fs::read_to_string(&self.path).at_path(&self.path)
    }
}
