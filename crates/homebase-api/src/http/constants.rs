//! Shared HTTP constants.

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

/// Prefix static files are served under when a file root is configured.
pub const FILES_ROUTE: &str = "/files";
/// Upload route without a filename segment.
pub const UPLOAD_ROUTE: &str = "/upload";
/// Upload route carrying the filename as a path segment.
pub const UPLOAD_NAMED_ROUTE: &str = "/upload/{filename}";

/// Mode applied to every uploaded file.
pub(crate) const UPLOAD_FILE_MODE: u32 = 0o777;
