use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Delovable operations
#[derive(Error, Debug)]
pub enum DelovableError {
    #[error("Project path does not exist: {path:?}")]
    ProjectNotFound { path: PathBuf },

    #[error("Malformed manifest {path:?}: {message}")]
    MalformedManifest { path: PathBuf, message: String },

    #[error("Failed to access {path:?}: {source}")]
    FileIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unsupported platform: {0} (expected cloudflare, vercel, netlify or none)")]
    UnsupportedPlatform(String),

    #[error("Remote repository error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid markup rule: {0}")]
    Rule(#[from] regex::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Job already exists: {0}")]
    JobExists(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),
}

impl DelovableError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileIo {
            path: path.into(),
            source,
        }
    }
}

/// Failures raised while locating or fetching a remote repository
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Invalid repository reference: {0}")]
    InvalidUrl(String),

    #[error("Unsupported repository host: {0}")]
    UnsupportedHost(String),

    #[error("Repository not found: {0}")]
    NotFound(String),

    #[error("Repository is private or inaccessible: {0}")]
    Inaccessible(String),

    #[error("Network failure while fetching {repo}: {message}")]
    Network { repo: String, message: String },

    #[error("Git operation failed: {0}")]
    Git(String),
}

impl RemoteError {
    /// Whether a caller may reasonably retry the same request
    pub fn is_retryable(&self) -> bool {
        matches!(self, RemoteError::Network { .. })
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found at {path:?}")]
    NotFound { path: PathBuf },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Result type alias for Delovable operations
pub type DelovableResult<T> = Result<T, DelovableError>;

/// Helper trait for attaching the offending path to I/O errors
pub trait IoContext<T> {
    fn at_path(self, path: impl Into<PathBuf>) -> DelovableResult<T>;
}

impl<T> IoContext<T> for Result<T, io::Error> {
    fn at_path(self, path: impl Into<PathBuf>) -> DelovableResult<T> {
        self.map_err(|e| DelovableError::io(path, e))
    }
}

/// Error display helper for CLI
pub fn display_error(error: &DelovableError) {
    use colored::Colorize;
    use std::error::Error;

    eprintln!("\n{} {}", "✗".bright_red().bold(), "Operation failed".bright_red().bold());
    eprintln!("  {} {}", "├".bright_black(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} Caused by: {}", "├".bright_black(), err);
        source = err.source();
    }

    match error {
        DelovableError::ProjectNotFound { .. } => {
            eprintln!("  {} Check that the project path is correct", "└".bright_cyan());
        }
        DelovableError::UnsupportedPlatform(_) => {
            eprintln!("  {} Use one of: cloudflare, vercel, netlify, none", "└".bright_cyan());
        }
        DelovableError::Remote(RemoteError::Inaccessible(_)) => {
            eprintln!("  {} Make the repository public or clone it yourself", "└".bright_cyan());
            eprintln!("    Then run: delovable <path-to-clone>");
        }
        DelovableError::Remote(remote) if remote.is_retryable() => {
            eprintln!("  {} This looks transient, try again in a moment", "└".bright_cyan());
        }
        DelovableError::FileIo { path, .. } => {
            eprintln!("  {} Check file permissions for {:?}", "└".bright_cyan(), path);
        }
        _ => {
            eprintln!("  {} Run with --verbose for more details", "└".bright_black());
        }
    }
}
