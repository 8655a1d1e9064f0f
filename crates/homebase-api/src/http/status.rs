//! Status probe.

use axum::{http::StatusCode, response::Response};

use crate::http::response::pretty_json;

/// Value returned by the probe.
pub const STATUS_OK: &str = "OK";

/// `GET /`: report that the server is up.
pub(crate) async fn status() -> Response {
    pretty_json(StatusCode::OK, &STATUS_OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn probe_returns_json_ok() -> anyhow::Result<()> {
        let response = status().await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        assert_eq!(serde_json::from_slice::<String>(&body)?, STATUS_OK);
        Ok(())
    }
}
