//! Upstream transport subsystem.
//!
//! # Data Flow
//! ```text
//! BaseApiClient
//!     → chain.rs (ResilientTransport, one per upstream)
//!         → resilience::retries (RetryLayer: bounded, idempotent-only)
//!         → breaker.rs (CircuitBreakerLayer: admission + outcome recording)
//!         → base.rs (HyperTransport: pooled HTTP/1.1 client, deadline, cancel)
//!     → upstream
//! ```
//!
//! # Design Decisions
//! - Each layer is a `tower::Service`; composition is `ServiceBuilder`
//! - The chain is built once per upstream and shared by all requests
//! - A 5xx becomes `TransportError::UpstreamStatus` inside the chain so the
//!   breaker counts it; the retry layer unwraps it again on the way out

pub mod base;
pub mod body;
pub mod breaker;
pub mod chain;
pub mod error;

pub use base::HyperTransport;
pub use body::{full_body, RequestBody, ResponseBody};
pub use breaker::{CircuitBreakerLayer, CircuitBreakerService};
pub use chain::ResilientTransport;
pub use error::{BoxError, TransportError};

use std::future::Future;
use std::pin::Pin;
use tower::{Service, ServiceExt};

/// Request flowing through the chain.
pub type UpstreamRequest = http::Request<RequestBody>;

/// Response flowing back through the chain.
pub type UpstreamResponse = http::Response<ResponseBody>;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// A shareable, type-erased round-tripper.
///
/// Every `tower::Service` over upstream requests that is `Clone + Sync`
/// is a `RoundTripper`, so tests can drop in `tower::service_fn` mocks.
pub trait RoundTripper: Send + Sync {
    fn round_trip(&self, request: UpstreamRequest) -> BoxFuture<Result<UpstreamResponse, TransportError>>;
}

impl<S> RoundTripper for S
where
    S: Service<UpstreamRequest, Response = UpstreamResponse, Error = TransportError>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
{
    fn round_trip(&self, request: UpstreamRequest) -> BoxFuture<Result<UpstreamResponse, TransportError>> {
        Box::pin(self.clone().oneshot(request))
    }
}
