//! Directory lifecycle: ensure-exists, one-level listing, and best-effort purge.
//!
//! # Design
//! - `ensure` only sets the mode on directories it creates; existing directories keep theirs.
//! - Listings are always sorted by name so callers process entries deterministically.
//! - `purge` attempts every child and reports all failures together.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{FsOpsError, FsOpsResult};

/// Mode applied to directories created by [`ensure`].
pub const DIRECTORY_MODE: u32 = 0o754;

/// One immediate child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// File name of the child.
    pub name: String,
    /// Full path of the child.
    pub full_path: PathBuf,
    /// Whether the child is a directory (symlinks are not followed).
    pub is_dir: bool,
    /// Destination path relative to an upload root, set by tree collection.
    pub relative_out_path: Option<PathBuf>,
}

/// Create `path` and any missing parents.
///
/// Idempotent and safe to call concurrently for the same path.
///
/// # Errors
///
/// Returns [`FsOpsError::DirectoryCreate`] when the directory cannot be created
/// or a non-directory already occupies the path.
pub fn ensure(path: &Path) -> FsOpsResult<()> {
    if path.is_dir() {
        return Ok(());
    }

    fs::create_dir_all(path).map_err(|source| FsOpsError::DirectoryCreate {
        path: path.to_path_buf(),
        source,
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(DIRECTORY_MODE)).map_err(
            |source| FsOpsError::DirectoryCreate {
                path: path.to_path_buf(),
                source,
            },
        )?;
    }

    debug!(path = %path.display(), "directory created");
    Ok(())
}

/// List the immediate children of `path`, sorted by name.
///
/// # Errors
///
/// Returns [`FsOpsError::Io`] when the directory cannot be read.
pub fn list_immediate(path: &Path) -> FsOpsResult<Vec<DirEntry>> {
    let reader =
        fs::read_dir(path).map_err(|err| FsOpsError::io("list_immediate.read_dir", path, err))?;

    let mut entries = Vec::new();
    for entry in reader {
        let entry = entry.map_err(|err| FsOpsError::io("list_immediate.entry", path, err))?;
        let file_type = entry
            .file_type()
            .map_err(|err| FsOpsError::io("list_immediate.file_type", entry.path(), err))?;
        entries.push(DirEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            full_path: entry.path(),
            is_dir: file_type.is_dir(),
            relative_out_path: None,
        });
    }
    entries.sort_by(|left, right| left.name.cmp(&right.name));
    Ok(entries)
}

/// Remove every immediate child of `path`, leaving `path` itself in place.
///
/// # Errors
///
/// Returns [`FsOpsError::Io`] when `path` cannot be listed, or
/// [`FsOpsError::WorkspacePurge`] naming every child that survived.
pub fn purge(path: &Path) -> FsOpsResult<()> {
    purge_with(path, remove_child)
}

fn remove_child(child: &DirEntry) -> io::Result<()> {
    if child.is_dir {
        fs::remove_dir_all(&child.full_path)
    } else {
        fs::remove_file(&child.full_path)
    }
}

fn purge_with(path: &Path, remove: impl Fn(&DirEntry) -> io::Result<()>) -> FsOpsResult<()> {
    let children = list_immediate(path)?;
    let mut failed = Vec::new();
    let mut last_error: Option<io::Error> = None;

    for child in children {
        if let Err(err) = remove(&child) {
            warn!(path = %child.full_path.display(), error = %err, "failed to remove workspace entry");
            failed.push(child.name);
            last_error = Some(err);
        }
    }

    match last_error {
        None => Ok(()),
        Some(source) => Err(FsOpsError::WorkspacePurge {
            path: path.to_path_buf(),
            failed,
            source,
        }),
    }
}
