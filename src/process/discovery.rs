use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::config::EXCLUDED_DIRS;
use crate::error::DelovableError;

const MARKUP_EXTENSIONS: &[&str] = &["html", "htm"];

/// Markup files found under a root, plus entries that could not be read
#[derive(Debug, Default)]
pub struct Discovered {
    pub files: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, DelovableError)>,
}

pub fn is_markup_file(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| {
            MARKUP_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

fn is_excluded(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| EXCLUDED_DIRS.contains(&name))
}

/// Walk `root` for markup documents, skipping dependency caches and build
/// output. Paths come back sorted.
///
/// With `follow_links`, broken links and link cycles come back as failures.
pub fn markup_files(root: &Path, follow_links: bool) -> Discovered {
    let mut discovered = Discovered::default();

    for entry in WalkDir::new(root)
        .follow_links(follow_links)
        .into_iter()
        .filter_entry(|e| !is_excluded(e))
    {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && is_markup_file(entry.path()) {
                    discovered.files.push(entry.into_path());
                }
            }
            Err(err) => {
                let path = err.path().unwrap_or(root).to_path_buf();
                let message = err.to_string();
                let source = err
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, message));
                tracing::warn!(path = %path.display(), error = %source, "skipping unreadable entry");
                discovered.failures.push((path.clone(), DelovableError::io(path, source)));
            }
        }
    }

    discovered.files.sort();
    discovered
}
