//! Zip discovery and path-contained extraction.
//!
//! # Design
//! - Archives are recognised by their leading magic bytes, never by extension.
//! - Every entry name is normalised lexically and must stay strictly inside the target.
//! - Created parents are canonicalised and re-checked so symlinks cannot redirect writes.
//! - Extraction is not transactional: entries written before a failure stay on disk.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use zip::ZipArchive;

use crate::{FsOpsError, FsOpsResult, workspace};

/// Leading bytes of a zip local file header.
pub const ZIP_MAGIC: &[u8; 4] = b"PK\x03\x04";

/// Suffix of in-flight downloads; discovery ignores such files.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Maximum number of bytes inspected when sniffing content.
const SNIFF_LEN: u64 = 512;

/// Result of inspecting the first bytes of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// Zip archive.
    Zip,
    /// Anything else with at least one byte.
    Other,
    /// Zero-length file; the type cannot be determined.
    Empty,
}

impl ContentType {
    /// MIME type reported for the classification.
    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Zip => "application/zip",
            Self::Other => "application/octet-stream",
            Self::Empty => "",
        }
    }
}

/// Classify a file by its first bytes.
///
/// # Errors
///
/// Returns [`FsOpsError::Io`] when the file cannot be opened or read.
pub fn sniff_content_type(path: &Path) -> FsOpsResult<ContentType> {
    let file = File::open(path).map_err(|err| FsOpsError::io("sniff.open", path, err))?;
    let mut head = Vec::with_capacity(4);
    file.take(SNIFF_LEN)
        .read_to_end(&mut head)
        .map_err(|err| FsOpsError::io("sniff.read", path, err))?;

    Ok(if head.is_empty() {
        ContentType::Empty
    } else if head.starts_with(ZIP_MAGIC) {
        ContentType::Zip
    } else {
        ContentType::Other
    })
}

/// Return the regular files in `inbox` whose content is a zip archive, sorted by name.
///
/// Files that cannot be read or are empty are logged and skipped, as are
/// partial downloads ending in [`PARTIAL_SUFFIX`].
///
/// # Errors
///
/// Returns [`FsOpsError::Io`] when the inbox itself cannot be listed.
pub fn discover_archives(inbox: &Path) -> FsOpsResult<Vec<PathBuf>> {
    let mut archives = Vec::new();
    for entry in workspace::list_immediate(inbox)? {
        if entry.is_dir {
            continue;
        }
        if entry.name.ends_with(PARTIAL_SUFFIX) {
            debug!(file = %entry.name, "skipping partial download");
            continue;
        }
        match sniff_content_type(&entry.full_path) {
            Ok(ContentType::Zip) => archives.push(entry.full_path),
            Ok(ContentType::Other) => {
                debug!(file = %entry.name, "skipping non-archive file");
            }
            Ok(ContentType::Empty) => {
                warn!(file = %entry.name, "unable to determine content type, skipping");
            }
            Err(err) => {
                warn!(file = %entry.name, error = ?err, "unable to determine content type, skipping");
            }
        }
    }
    Ok(archives)
}

/// Extract `archive` into `target`, returning the number of files written.
///
/// The archive is fully opened before anything on disk changes. Entries are
/// then processed in archive order; the first entry that would escape
/// `target` aborts the extraction with [`FsOpsError::PathTraversal`].
///
/// # Errors
///
/// - [`FsOpsError::ArchiveUnreadable`] when the archive cannot be opened or decoded.
/// - [`FsOpsError::PathTraversal`] when an entry resolves outside `target`.
/// - [`FsOpsError::ExtractionFailed`] on any IO error while writing.
pub fn extract(archive: &Path, target: &Path) -> FsOpsResult<usize> {
    let file = File::open(archive)
        .map_err(|err| FsOpsError::unreadable(archive, zip::result::ZipError::Io(err)))?;
    let mut zip = ZipArchive::new(file).map_err(|err| FsOpsError::unreadable(archive, err))?;

    fs::create_dir_all(target)
        .map_err(|err| FsOpsError::extraction("extract.create_target", target, err))?;
    let root = fs::canonicalize(target)
        .map_err(|err| FsOpsError::extraction("extract.canonicalize_target", target, err))?;

    let mut written = 0;
    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|err| FsOpsError::unreadable(archive, err))?;
        let name = entry.name().to_string();
        let traversal = || FsOpsError::PathTraversal {
            archive: archive.to_path_buf(),
            entry: name.clone(),
        };

        let relative = normalize_entry_name(&name).ok_or_else(traversal)?;
        if relative.as_os_str().is_empty() {
            if entry.is_dir() {
                continue;
            }
            return Err(traversal());
        }
        let destination = root.join(&relative);

        if entry.is_dir() {
            if !create_contained_dirs(&root, &relative)? {
                return Err(traversal());
            }
            continue;
        }

        if let Some(parent) = relative.parent()
            && !create_contained_dirs(&root, parent)?
        {
            return Err(traversal());
        }
        if fs::symlink_metadata(&destination).is_ok_and(|meta| meta.file_type().is_symlink()) {
            fs::remove_file(&destination)
                .map_err(|err| FsOpsError::extraction("extract.replace_link", &destination, err))?;
        }

        let mode = entry.unix_mode().map(|mode| mode & 0o7777);
        let mut output = create_output(&destination, mode)?;
        io::copy(&mut entry, &mut output)
            .map_err(|err| FsOpsError::extraction("extract.copy", &destination, err))?;
        drop(output);

        #[cfg(unix)]
        if let Some(mode) = mode {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&destination, fs::Permissions::from_mode(mode)).map_err(
                |err| FsOpsError::extraction("extract.set_permissions", &destination, err),
            )?;
        }

        debug!(entry = %name, path = %destination.display(), "extracted archive entry");
        written += 1;
    }

    Ok(written)
}

/// Lexically resolve an entry name to a path relative to the target.
///
/// Returns `None` for absolute names, drive prefixes, or `..` that climbs past the root.
fn normalize_entry_name(name: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(segment) => relative.push(segment),
            Component::CurDir => {}
            Component::ParentDir => {
                if !relative.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(relative)
}

/// Create `relative` under `root` one component at a time.
///
/// Each component is resolved before anything is created beneath it, so a
/// symlink pointing outside `root` stops the walk before it creates anything.
/// Returns `false` when a component resolves outside `root`.
fn create_contained_dirs(root: &Path, relative: &Path) -> FsOpsResult<bool> {
    let mut current = root.to_path_buf();
    for component in relative.components() {
        current.push(component);
        if let Err(err) = fs::create_dir(&current)
            && err.kind() != io::ErrorKind::AlreadyExists
        {
            return Err(FsOpsError::extraction("extract.create_dir", &current, err));
        }
        if !is_contained(root, &current) {
            return Ok(false);
        }
    }
    Ok(true)
}

fn is_contained(root: &Path, path: &Path) -> bool {
    fs::canonicalize(path).is_ok_and(|resolved| resolved.starts_with(root))
}

fn create_output(destination: &Path, mode: Option<u32>) -> FsOpsResult<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    if let Some(mode) = mode {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode | 0o200);
    }
    #[cfg(not(unix))]
    let _ = mode;
    options
        .open(destination)
        .map_err(|err| FsOpsError::extraction("extract.create_file", destination, err))
}
