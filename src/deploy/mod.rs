//! Deployment configuration for the supported hosting platforms.
//!
//! Each platform owns exactly one well-known file at the project root. An
//! existing file is never rewritten or merged.

pub mod templates;

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{DelovableError, DelovableResult, IoContext};
use crate::storage::AtomicFile;

/// Used when the root has no directory name of its own, such as `/`
pub const FALLBACK_PROJECT_NAME: &str = "site";

static UNSAFE_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9-]").expect("Failed to compile project name pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Cloudflare,
    Vercel,
    Netlify,
    #[default]
    None,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Cloudflare,
        Platform::Vercel,
        Platform::Netlify,
        Platform::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Cloudflare => "cloudflare",
            Platform::Vercel => "vercel",
            Platform::Netlify => "netlify",
            Platform::None => "none",
        }
    }

    /// Configuration file this platform reads, `None` for the sentinel
    pub fn config_file(&self) -> Option<&'static str> {
        match self {
            Platform::Cloudflare => Some("wrangler.toml"),
            Platform::Vercel => Some("vercel.json"),
            Platform::Netlify => Some("netlify.toml"),
            Platform::None => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Platform::None)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = DelovableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| DelovableError::UnsupportedPlatform(s.to_string()))
    }
}

/// What `emit` did for one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmitResult {
    pub platform: Platform,
    pub created: bool,
    pub path: Option<PathBuf>,
}

/// Lower-case the directory name and replace anything outside `[a-z0-9-]`.
/// The path is taken as given; callers canonicalize relative roots.
pub fn project_name(project_root: &Path) -> String {
    match project_root.file_name() {
        Some(name) => {
            let base = name.to_string_lossy().to_lowercase();
            UNSAFE_NAME_CHARS.replace_all(&base, "-").into_owned()
        }
        None => FALLBACK_PROJECT_NAME.to_string(),
    }
}

pub fn emit(project_root: &Path, platform: Platform) -> DelovableResult<EmitResult> {
    emit_on(project_root, platform, Utc::now().date_naive())
}

/// `emit` with an explicit compatibility date. The root is canonicalized
/// first so `.` and `sub/..` name the project after the real directory.
pub fn emit_on(
    project_root: &Path,
    platform: Platform,
    date: NaiveDate,
) -> DelovableResult<EmitResult> {
    let Some(file_name) = platform.config_file() else {
        return Ok(EmitResult {
            platform,
            created: false,
            path: None,
        });
    };

    let project_root = project_root.canonicalize().at_path(project_root)?;
    let path = project_root.join(file_name);
    if path.exists() {
        tracing::info!(path = %path.display(), "deployment config already exists, leaving it alone");
        return Ok(EmitResult {
            platform,
            created: false,
            path: Some(path),
        });
    }

    let content = render(platform, &project_name(&project_root), date)?;
    AtomicFile::new(&path)?.write(content.as_bytes())?;
    tracing::info!(path = %path.display(), %platform, "created deployment config");

    Ok(EmitResult {
        platform,
        created: true,
        path: Some(path),
    })
}

/// What `emit` would do, without touching the filesystem
pub fn plan(project_root: &Path, platform: Platform) -> EmitResult {
    let path = platform.config_file().map(|name| project_root.join(name));
    let created = path.as_deref().is_some_and(|p| !p.exists());

    EmitResult {
        platform,
        created,
        path,
    }
}

/// Content of the platform's config file
pub fn render(platform: Platform, project_name: &str, date: NaiveDate) -> DelovableResult<String> {
    match platform {
        Platform::Cloudflare => Ok(templates::wrangler(project_name, date)),
        Platform::Vercel => {
            templates::vercel().map_err(|e| DelovableError::InvalidInput(e.to_string()))
        }
        Platform::Netlify => Ok(templates::netlify()),
        Platform::None => Ok(String::new()),
    }
}
