//! Zip fixture writers.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use zip::write::FileOptions;

/// Entry written into a fixture archive.
#[derive(Debug, Clone, Copy)]
pub enum ZipEntry<'a> {
    /// Regular file with its stored name and contents.
    File(&'a str, &'a [u8]),
    /// Regular file with an explicit unix permission mode.
    FileWithMode(&'a str, &'a [u8], u32),
    /// Directory entry; the name should end with `/`.
    Dir(&'a str),
}

/// Write a zip archive containing the given files, stored names taken verbatim.
///
/// # Errors
///
/// Returns an error when the archive cannot be created or written.
pub fn write_zip_archive(archive: &Path, entries: &[(&str, &[u8])]) -> Result<()> {
    let entries: Vec<ZipEntry<'_>> = entries
        .iter()
        .map(|&(name, contents)| ZipEntry::File(name, contents))
        .collect();
    write_zip_entries(archive, &entries)
}

/// Write a zip archive from a mixed list of files and directories.
///
/// # Errors
///
/// Returns an error when the archive cannot be created or written.
pub fn write_zip_entries(archive: &Path, entries: &[ZipEntry<'_>]) -> Result<()> {
    let file = File::create(archive)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default();
    for entry in entries {
        match *entry {
            ZipEntry::File(name, contents) => {
                zip.start_file(name, options)?;
                zip.write_all(contents)?;
            }
            ZipEntry::FileWithMode(name, contents, mode) => {
                zip.start_file(name, options.unix_permissions(mode))?;
                zip.write_all(contents)?;
            }
            ZipEntry::Dir(name) => {
                zip.add_directory(name, options)?;
            }
        }
    }
    zip.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_archive_starts_with_local_header_magic() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let archive = temp.path().join("bundle.zip");
        write_zip_entries(
            &archive,
            &[ZipEntry::Dir("nested/"), ZipEntry::File("nested/a.txt", b"a")],
        )?;
        let bytes = std::fs::read(&archive)?;
        assert_eq!(&bytes[..4], b"PK\x03\x04");
        Ok(())
    }
}
