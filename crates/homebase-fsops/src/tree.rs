//! Local file collection for the uploader.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::DirEntry;

/// Directory names never descended into when walking an upload root.
pub const SKIPPED_DIRS: &[&str] = &[".git", ".hg", ".svn"];

/// Query parameters derived from a relative out-path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadTarget {
    /// Slash-separated directory under the server root, if any.
    pub directory: Option<String>,
    /// Final path segment.
    pub filename: Option<String>,
}

impl UploadTarget {
    /// Split a relative out-path into `directory` and `filename`.
    #[must_use]
    pub fn from_out_path(out_path: &Path) -> Self {
        let mut segments: Vec<String> = out_path
            .components()
            .filter_map(|component| match component {
                Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        let filename = segments.pop();
        let directory = (!segments.is_empty()).then(|| segments.join("/"));
        Self {
            directory,
            filename,
        }
    }
}

/// Walk `root` depth-first in name order and return every non-directory entry.
///
/// Each entry's out-path is the root's own name followed by its path below the
/// root. Unreadable entries are logged and skipped.
#[must_use]
pub fn collect_tree(root: &Path) -> Vec<DirEntry> {
    let root_name = root_name(root);
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !(entry.depth() > 0 && is_skipped_dir(entry)));

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(root = %root.display(), error = %err, "error accessing path, skipping");
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        files.push(DirEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            full_path: entry.path().to_path_buf(),
            is_dir: false,
            relative_out_path: Some(root_name.join(relative)),
        });
    }
    files
}

/// Combine a walked root directory with explicit file or directory arguments.
///
/// Explicit files upload under their own name; explicit directories are walked
/// like the root. Arguments that do not exist are logged and skipped.
#[must_use]
pub fn collect_upload_entries(root: Option<&Path>, explicit: &[PathBuf]) -> Vec<DirEntry> {
    let mut entries = root.map(collect_tree).unwrap_or_default();

    for path in explicit {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot stat upload argument, skipping");
                continue;
            }
        };
        if metadata.is_dir() {
            entries.extend(collect_tree(path));
            continue;
        }
        let Some(name) = path.file_name() else {
            continue;
        };
        entries.push(DirEntry {
            name: name.to_string_lossy().into_owned(),
            full_path: path.clone(),
            is_dir: false,
            relative_out_path: Some(PathBuf::from(name)),
        });
    }
    entries
}

fn is_skipped_dir(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn root_name(root: &Path) -> PathBuf {
    root.file_name()
        .map(PathBuf::from)
        .or_else(|| {
            fs::canonicalize(root)
                .ok()
                .and_then(|resolved| resolved.file_name().map(PathBuf::from))
        })
        .unwrap_or_default()
}
