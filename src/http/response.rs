//! Client-facing error responses.
//!
//! Successful upstream responses pass through untouched (see `proxy`); this
//! module only covers the case where no upstream response exists.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Generic body for unreachable upstreams. The cause is never included.
pub const UPSTREAM_FAILURE_BODY: &str = "Bad Gateway";

pub fn upstream_failure() -> Response {
    (StatusCode::BAD_GATEWAY, UPSTREAM_FAILURE_BODY).into_response()
}
