//! Filesystem operations for HomeBase: safe archive ingestion, workspace lifecycle,
//! and local tree collection for uploads.
#![forbid(unsafe_code)]
#![deny(
    unused_imports,
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

pub mod archive;
pub mod error;
pub mod tree;
pub mod workspace;

pub use archive::{
    ContentType, PARTIAL_SUFFIX, discover_archives, extract, sniff_content_type,
};
pub use error::{FsOpsError, FsOpsResult};
pub use tree::{UploadTarget, collect_tree, collect_upload_entries};
pub use workspace::{DirEntry, ensure, list_immediate, purge};
