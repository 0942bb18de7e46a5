//! Edge middleware.
//!
//! - `request_timeout`: bounds the whole request; the timeout answer is an envelope
//! - `record_metrics`: inbound request counter and latency histogram
//! - `crate::auth::auth_context_middleware` (mounted from the server) builds
//!   the per-request context

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::{Duration, Instant};

use crate::envelope::{BaseResponse, MSG_TIMEOUT};
use crate::observability::metrics;

/// Answer `504 {"code":504,"message":"Request timed out"}` once `limit`
/// elapses. Dropping the inner future cancels the request's context, which
/// aborts the upstream call it was waiting on.
pub async fn request_timeout(State(limit): State<Duration>, request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(method = %method, path = %path, timeout = ?limit, "Request timed out");
            BaseResponse::error(StatusCode::GATEWAY_TIMEOUT.as_u16().into(), MSG_TIMEOUT).into_response()
        }
    }
}

pub async fn record_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    metrics::record_inbound_request(&method, response.status().as_u16(), start);
    response
}
