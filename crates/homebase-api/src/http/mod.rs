//! HTTP surface: router, handlers, and response helpers.

/// Shared header and route constants.
pub mod constants;
/// JSON error envelope.
pub mod errors;
/// Pretty JSON response helper.
pub mod response;
/// Router construction.
pub mod router;
/// Status probe.
pub mod status;
/// Upload handlers.
pub mod upload;
