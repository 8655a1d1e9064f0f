//! Pretty-printed JSON responses.

use axum::{
    http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Serialize `value` as indented JSON with a trailing newline.
pub(crate) fn pretty_json<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_string_pretty(value) {
        Ok(mut body) => {
            body.push('\n');
            (
                status,
                [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
                body,
            )
                .into_response()
        }
        Err(err) => {
            error!(error = %err, "could not encode JSON");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
