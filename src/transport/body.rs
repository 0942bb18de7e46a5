//! Request and response bodies for the upstream chain.
//!
//! # Replay rules
//! - `Empty` and `Bytes` are replayable: each attempt gets a cheap clone
//! - `Stream` is not replayable as-is; the retry layer snapshots it into
//!   `Bytes` once, before the first attempt
//! - `OneShot` is declared non-replayable; a non-empty one-shot body gets
//!   exactly one attempt whatever the method

use bytes::Bytes;
use http_body::Body as _;
use http_body_util::{combinators::BoxBody, BodyExt, Empty, Full};
use std::fmt;

use crate::transport::error::{BoxError, TransportError};

/// Body of every response flowing back through the chain.
pub type ResponseBody = BoxBody<Bytes, BoxError>;

/// Wrap fully-read bytes as a response body.
pub fn full_body(bytes: Bytes) -> ResponseBody {
    Full::new(bytes).map_err(|never| match never {}).boxed()
}

/// Body of an upstream request.
pub enum RequestBody {
    Empty,
    Bytes(Bytes),
    Stream(BoxBody<Bytes, BoxError>),
    OneShot(BoxBody<Bytes, BoxError>),
}

impl RequestBody {
    pub fn empty() -> Self {
        RequestBody::Empty
    }

    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        RequestBody::Bytes(bytes.into())
    }

    /// Replayable by cloning, without reading anything.
    pub fn is_replayable(&self) -> bool {
        matches!(self, RequestBody::Empty | RequestBody::Bytes(_))
    }

    /// A one-shot body that may carry data.
    ///
    /// An exact size hint of zero counts as empty.
    pub fn forbids_replay(&self) -> bool {
        match self {
            RequestBody::OneShot(body) => body.size_hint().exact() != Some(0),
            _ => false,
        }
    }

    /// Clone a replayable body; `None` for streams.
    pub fn try_clone(&self) -> Option<Self> {
        match self {
            RequestBody::Empty => Some(RequestBody::Empty),
            RequestBody::Bytes(bytes) => Some(RequestBody::Bytes(bytes.clone())),
            RequestBody::Stream(_) | RequestBody::OneShot(_) => None,
        }
    }

    /// Read a `Stream` body into memory so it can be replayed.
    ///
    /// Other variants are returned unchanged.
    pub async fn snapshot(self) -> Result<Self, TransportError> {
        match self {
            RequestBody::Stream(body) => {
                let collected = body.collect().await.map_err(TransportError::Body)?;
                Ok(RequestBody::Bytes(collected.to_bytes()))
            }
            other => Ok(other),
        }
    }

    pub(crate) fn into_box_body(self) -> BoxBody<Bytes, BoxError> {
        match self {
            RequestBody::Empty => Empty::new().map_err(|never| match never {}).boxed(),
            RequestBody::Bytes(bytes) => Full::new(bytes).map_err(|never| match never {}).boxed(),
            RequestBody::Stream(body) | RequestBody::OneShot(body) => body,
        }
    }
}

impl Default for RequestBody {
    fn default() -> Self {
        RequestBody::Empty
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Empty => f.write_str("Empty"),
            RequestBody::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            RequestBody::Stream(_) => f.write_str("Stream"),
            RequestBody::OneShot(_) => f.write_str("OneShot"),
        }
    }
}
