//! Upload handlers.
//!
//! # Design
//! - The body is streamed to disk; nothing is buffered beyond one chunk.
//! - `directory` and `filename` are resolved component by component and must stay
//!   under the upload root.
//! - Concurrent uploads to the same target race; the last writer wins.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::Response,
};
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::http::constants::UPLOAD_FILE_MODE;
use crate::http::errors::ApiError;
use crate::state::ApiState;

/// Query parameters accepted by the upload routes.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct UploadQuery {
    filename: Option<String>,
    directory: Option<String>,
}

/// `POST /upload`.
pub(crate) async fn upload(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<UploadQuery>,
    body: Body,
) -> Result<Response, ApiError> {
    store(&state, None, query, body).await
}

/// `POST /upload/{filename}`.
pub(crate) async fn upload_named(
    State(state): State<Arc<ApiState>>,
    AxumPath(filename): AxumPath<String>,
    Query(query): Query<UploadQuery>,
    body: Body,
) -> Result<Response, ApiError> {
    store(&state, Some(filename), query, body).await
}

async fn store(
    state: &ApiState,
    path_name: Option<String>,
    query: UploadQuery,
    body: Body,
) -> Result<Response, ApiError> {
    let name = query
        .filename
        .filter(|name| !name.is_empty())
        .or(path_name)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            ApiError::bad_request("error creating upload file", "filename not specified")
        })?;
    let target = UploadPath::resolve(state.upload_root(), query.directory.as_deref(), &name)?;

    if let Some(directory) = &target.directory {
        homebase_fsops::ensure(directory).map_err(|err| {
            warn!(path = %directory.display(), error = %err, "upload directory creation failed");
            ApiError::internal("error creating upload path", directory.display().to_string())
        })?;
    }

    info!(filename = %name, path = %target.file.display(), "saving uploaded file");
    let written = tokio::time::timeout(state.request_timeout(), write_body(&target.file, body))
        .await
        .map_err(|_| ApiError::request_timeout(target.file.display().to_string()))??;

    set_upload_mode(&target.file).await?;

    Response::builder()
        .status(StatusCode::OK)
        .body(Body::from(format!("{written} bytes received.\n")))
        .map_err(|err| ApiError::internal("error building response", err.to_string()))
}

async fn write_body(path: &Path, body: Body) -> Result<u64, ApiError> {
    let mut file = fs::File::create(path)
        .await
        .map_err(|err| ApiError::internal("error creating upload file", err.to_string()))?;
    let mut stream = body.into_data_stream();
    let mut written: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk
            .map_err(|err| ApiError::internal("error writing upload file", err.to_string()))?;
        file.write_all(&chunk)
            .await
            .map_err(|err| ApiError::internal("error writing upload file", err.to_string()))?;
        written += chunk.len() as u64;
    }
    file.flush()
        .await
        .map_err(|err| ApiError::internal("error writing upload file", err.to_string()))?;
    Ok(written)
}

#[cfg(unix)]
async fn set_upload_mode(path: &Path) -> Result<(), ApiError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, std::fs::Permissions::from_mode(UPLOAD_FILE_MODE))
        .await
        .map_err(|err| {
            ApiError::internal("error setting permissions for upload file", err.to_string())
        })
}

#[cfg(not(unix))]
async fn set_upload_mode(_path: &Path) -> Result<(), ApiError> {
    let _ = UPLOAD_FILE_MODE;
    Ok(())
}

/// Destination of one upload.
#[derive(Debug, PartialEq, Eq)]
struct UploadPath {
    /// Directory to create first, when a `directory` parameter was given.
    directory: Option<PathBuf>,
    /// File to write.
    file: PathBuf,
}

impl UploadPath {
    fn resolve(root: &Path, directory: Option<&str>, filename: &str) -> Result<Self, ApiError> {
        if !is_single_component(filename) {
            return Err(ApiError::bad_request(
                "invalid filename",
                format!("filename {filename:?} must be a single path segment"),
            ));
        }

        let mut relative = PathBuf::new();
        for segment in directory.unwrap_or_default().split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => {
                    return Err(ApiError::bad_request(
                        "invalid directory",
                        "directory escapes the upload root",
                    ));
                }
                other if is_single_component(other) => relative.push(other),
                other => {
                    return Err(ApiError::bad_request(
                        "invalid directory",
                        format!("unsupported directory segment {other:?}"),
                    ));
                }
            }
        }

        let directory = (!relative.as_os_str().is_empty()).then(|| root.join(&relative));
        let file = directory.as_deref().unwrap_or(root).join(filename);
        Ok(Self { directory, file })
    }
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_segments_join_under_root() -> Result<(), ApiError> {
        let root = Path::new("/srv/files");
        let target = UploadPath::resolve(root, Some("a/b"), "c.txt")?;
        assert_eq!(target.directory, Some(PathBuf::from("/srv/files/a/b")));
        assert_eq!(target.file, PathBuf::from("/srv/files/a/b/c.txt"));

        let leading = UploadPath::resolve(root, Some("/a//./b/"), "c.txt")?;
        assert_eq!(leading.file, PathBuf::from("/srv/files/a/b/c.txt"));
        Ok(())
    }

    #[test]
    fn empty_or_slash_directory_writes_at_root() -> Result<(), ApiError> {
        let root = Path::new("/srv/files");
        for directory in [None, Some(""), Some("/")] {
            let target = UploadPath::resolve(root, directory, "c.txt")?;
            assert_eq!(target.directory, None);
            assert_eq!(target.file, PathBuf::from("/srv/files/c.txt"));
        }
        Ok(())
    }

    #[test]
    fn escaping_values_are_rejected() {
        let root = Path::new("/srv/files");
        for (directory, filename) in [
            (Some("../etc"), "passwd"),
            (Some("a/../../b"), "x"),
            (None, ".."),
            (None, "a/b.txt"),
            (None, "."),
        ] {
            let err = UploadPath::resolve(root, directory, filename)
                .err()
                .map(|err| err.status);
            assert_eq!(err, Some(StatusCode::BAD_REQUEST), "{directory:?} {filename}");
        }
    }
}
