//! Errors produced inside the upstream chain.

use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of a failed round trip.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection refused, DNS, TLS, reset, malformed response.
    #[error("upstream transport failure: {0}")]
    Transport(#[source] BoxError),

    #[error("upstream call timed out after {0:?}")]
    Timeout(Duration),

    #[error("request cancelled")]
    Cancelled,

    /// The breaker rejected the call without any I/O.
    #[error("circuit breaker is open")]
    BreakerOpen,

    /// Half-open slots are all taken.
    #[error("circuit breaker is overloaded")]
    BreakerOverloaded,

    /// Upstream answered with a 5xx. Carries the fully-read response so the
    /// caller can still see the upstream's body once retries run out.
    #[error("upstream responded with {}", .0.status())]
    UpstreamStatus(Box<http::Response<Bytes>>),

    #[error("request body error: {0}")]
    Body(#[source] BoxError),
}

impl TransportError {
    /// True for the breaker sentinels, which must never be retried.
    pub fn is_breaker_rejection(&self) -> bool {
        matches!(self, TransportError::BreakerOpen | TransportError::BreakerOverloaded)
    }

    /// True when another attempt could change the outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::Transport(_) | TransportError::Timeout(_) | TransportError::UpstreamStatus(_)
        )
    }
}
