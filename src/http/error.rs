//! Edge error mapping.
//!
//! The only place internal error kinds become envelopes. Upstream 4xx never
//! reach here; they arrive as envelopes and pass through untouched.

use axum::response::{IntoResponse, Response};

use crate::client::ClientError;
use crate::envelope::{
    BaseResponse, MSG_INVALID_UPSTREAM_RESPONSE, MSG_UPSTREAM_FAILED, MSG_UPSTREAM_UNAVAILABLE,
};
use crate::transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Path, query or body failed parsing or semantic checks.
    #[error("invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Upstream(#[from] ClientError),
}

impl ApiError {
    pub fn validation(reason: impl Into<String>) -> Self {
        ApiError::Validation(reason.into())
    }

    pub fn envelope(&self) -> BaseResponse {
        match self {
            ApiError::Validation(_) => BaseResponse::bad_request(),
            ApiError::Upstream(err) => BaseResponse::internal(upstream_message(err)),
        }
    }
}

fn upstream_message(err: &ClientError) -> &'static str {
    match err {
        ClientError::Transport(TransportError::BreakerOpen | TransportError::BreakerOverloaded) => {
            MSG_UPSTREAM_UNAVAILABLE
        }
        ClientError::Transport(_) | ClientError::Request(_) | ClientError::InvalidUrl { .. } => MSG_UPSTREAM_FAILED,
        ClientError::Serialization(_) | ClientError::Decode { .. } | ClientError::EmptyBody { .. } => {
            MSG_INVALID_UPSTREAM_RESPONSE
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Validation(reason) => tracing::debug!(reason = %reason, "Rejected invalid request"),
            ApiError::Upstream(err) => tracing::error!(error = %err, "Upstream call failed"),
        }
        self.envelope().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use std::time::Duration;

    #[test]
    fn validation_is_fixed_bad_request() {
        let envelope = ApiError::validation("page must be positive").envelope();
        assert_eq!(envelope.code, 400);
        assert_eq!(envelope.message, "Invalid request parameters");
    }

    #[test]
    fn breaker_rejection_has_distinct_message() {
        let open = ApiError::from(ClientError::Transport(TransportError::BreakerOpen)).envelope();
        assert_eq!(open.code, 500);
        assert_eq!(open.message, MSG_UPSTREAM_UNAVAILABLE);

        let timeout = ApiError::from(ClientError::Transport(TransportError::Timeout(Duration::from_secs(1)))).envelope();
        assert_eq!(timeout.message, MSG_UPSTREAM_FAILED);
    }

    #[test]
    fn codec_failures_are_invalid_upstream_response() {
        let envelope = ApiError::from(ClientError::EmptyBody { status: 204 }).envelope();
        assert_eq!(envelope.message, MSG_INVALID_UPSTREAM_RESPONSE);
        assert_eq!(ApiError::from(ClientError::EmptyBody { status: 204 }).into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
