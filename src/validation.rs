use crate::error::{DelovableError, DelovableResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static PATH_TRAVERSAL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.\./|\.\.\\|%2e%2e").expect("Failed to compile traversal pattern")
});

static CONTROL_CHAR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x00-\x1F\x7F]").expect("Failed to compile control pattern")
});

static IDENTIFIER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._-]+$").expect("Failed to compile identifier pattern")
});

const MAX_INPUT_LENGTH: usize = 512;
const MAX_IDENTIFIER_LENGTH: usize = 200;

/// Checks applied to anything arriving from a user or a remote caller
pub struct InputValidator;

impl InputValidator {
    /// A repository URL or `owner/repo` string
    pub fn validate_repository_input(input: &str) -> DelovableResult<()> {
        if input.is_empty() {
            return Err(DelovableError::InvalidInput(
                "Repository URL is required".to_string(),
            ));
        }

        if input.len() > MAX_INPUT_LENGTH {
            return Err(DelovableError::InvalidInput(format!(
                "Repository URL exceeds maximum length of {} bytes",
                MAX_INPUT_LENGTH
            )));
        }

        if CONTROL_CHAR_PATTERN.is_match(input) || input.chars().any(char::is_whitespace) {
            return Err(DelovableError::InvalidInput(format!(
                "Repository URL contains whitespace or control characters: {:?}",
                input
            )));
        }

        if PATH_TRAVERSAL_PATTERN.is_match(&input.to_ascii_lowercase()) {
            return Err(DelovableError::InvalidInput(format!(
                "Repository URL contains a parent directory reference: {}",
                input
            )));
        }

        Ok(())
    }

    /// Owner names, repository names and job ids: one path segment, no
    /// separators, never `.` or `..`
    pub fn validate_identifier(kind: &str, value: &str) -> DelovableResult<()> {
        if value.len() > MAX_IDENTIFIER_LENGTH {
            return Err(DelovableError::InvalidInput(format!(
                "Invalid {}: longer than {} characters",
                kind, MAX_IDENTIFIER_LENGTH
            )));
        }

        if !IDENTIFIER_PATTERN.is_match(value) || value == "." || value == ".." {
            return Err(DelovableError::InvalidInput(format!(
                "Invalid {}: {:?}. Use only letters, digits, '.', '_' and '-'",
                kind, value
            )));
        }

        Ok(())
    }

    /// Clone destinations must not exist yet, or be an empty directory
    pub fn validate_output_dir(path: &Path) -> DelovableResult<()> {
        if !path.exists() {
            return Ok(());
        }

        let is_empty_dir = path.is_dir()
            && path
                .read_dir()
                .map(|mut entries| entries.next().is_none())
                .unwrap_or(false);

        if is_empty_dir {
            Ok(())
        } else {
            Err(DelovableError::InvalidInput(format!(
                "Output directory already exists and is not empty: {}",
                path.display()
            )))
        }
    }
}
