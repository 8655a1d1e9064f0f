//! Router construction.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::Request,
    routing::{get, post},
};
use homebase_telemetry::build_sha;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::Span;

use crate::http::constants::{FILES_ROUTE, HEADER_REQUEST_ID, UPLOAD_NAMED_ROUTE, UPLOAD_ROUTE};
use crate::http::errors::method_not_allowed;
use crate::http::status::status;
use crate::http::upload::{upload, upload_named};
use crate::state::ApiState;

/// Build the distribution router.
///
/// `/files/` is only mounted when `file_root` is given.
pub fn build_router(state: ApiState, file_root: Option<&Path>) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            let request_id = request
                .headers()
                .get(HEADER_REQUEST_ID)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("")
                .to_string();
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                route = %request.uri().path(),
                request_id = %request_id,
                build_sha = %build_sha(),
                status_code = tracing::field::Empty,
                latency_ms = tracing::field::Empty
            )
        })
        .on_request(|_request: &Request<_>, _span: &Span| {})
        .on_response(
            |response: &axum::response::Response, latency: Duration, span: &Span| {
                span.record("status_code", response.status().as_u16());
                let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                span.record("latency_ms", latency_ms);
            },
        );
    let layered = ServiceBuilder::new()
        .layer(homebase_telemetry::propagate_request_id_layer())
        .layer(homebase_telemetry::set_request_id_layer())
        .layer(trace_layer);

    let router = Router::new()
        .route("/", get(status).fallback(method_not_allowed))
        .route(UPLOAD_ROUTE, post(upload).fallback(method_not_allowed))
        .route(
            UPLOAD_NAMED_ROUTE,
            post(upload_named).fallback(method_not_allowed),
        )
        .with_state(Arc::new(state));

    let router = match file_root {
        Some(root) => router.nest_service(FILES_ROUTE, ServeDir::new(root)),
        None => router,
    };
    router.layer(layered)
}
