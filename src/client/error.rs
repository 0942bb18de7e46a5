//! Errors of the JSON codec client.

use thiserror::Error;

use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The request body could not be encoded; nothing was sent.
    #[error("failed to serialize request body: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The upstream body is not a valid envelope.
    #[error("failed to decode upstream response (status {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    #[error("upstream returned an empty body with status {status}")]
    EmptyBody { status: u16 },

    #[error("invalid upstream url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build upstream request: {0}")]
    Request(#[from] http::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ClientError {
    /// The call was refused by an open or saturated breaker.
    pub fn is_breaker_rejection(&self) -> bool {
        matches!(self, ClientError::Transport(e) if e.is_breaker_rejection())
    }
}
