//! Circuit-breaker layer of the upstream chain.
//!
//! Admission happens before the inner call; the outcome is recorded after.
//! A 5xx response is read fully, rebuilt in memory and returned as
//! [`TransportError::UpstreamStatus`] so that it counts as a failure while
//! the response itself stays available to the layers above.

use http::Response;
use http_body_util::BodyExt;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service, ServiceExt};

use crate::resilience::CircuitBreaker;
use crate::transport::{BoxFuture, TransportError, UpstreamRequest, UpstreamResponse};

#[derive(Debug, Clone)]
pub struct CircuitBreakerLayer {
    breaker: Arc<CircuitBreaker>,
    apply_call_timeout: bool,
}

impl CircuitBreakerLayer {
    /// Layer using `execute_without_timeout`; the base transport owns the deadline.
    pub fn new(breaker: Arc<CircuitBreaker>) -> Self {
        Self {
            breaker,
            apply_call_timeout: false,
        }
    }

    /// Layer bounding each attempt with the breaker's `per_call_timeout`.
    pub fn with_call_timeout(breaker: Arc<CircuitBreaker>) -> Self {
        Self {
            breaker,
            apply_call_timeout: true,
        }
    }
}

impl<S> Layer<S> for CircuitBreakerLayer {
    type Service = CircuitBreakerService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CircuitBreakerService {
            inner,
            breaker: self.breaker.clone(),
            apply_call_timeout: self.apply_call_timeout,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerService<S> {
    inner: S,
    breaker: Arc<CircuitBreaker>,
    apply_call_timeout: bool,
}

impl<S> Service<UpstreamRequest> for CircuitBreakerService<S>
where
    S: Service<UpstreamRequest, Response = UpstreamResponse, Error = TransportError>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    type Response = UpstreamResponse;
    type Error = TransportError;
    type Future = BoxFuture<Result<UpstreamResponse, TransportError>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: UpstreamRequest) -> Self::Future {
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);
        let breaker = self.breaker.clone();
        let apply_call_timeout = self.apply_call_timeout;

        Box::pin(async move {
            let attempt = move || attempt_through(inner, request);
            if apply_call_timeout {
                breaker.execute(attempt).await
            } else {
                breaker.execute_without_timeout(attempt).await
            }
        })
    }
}

async fn attempt_through<S>(inner: S, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError>
where
    S: Service<UpstreamRequest, Response = UpstreamResponse, Error = TransportError>,
{
    let response = inner.oneshot(request).await?;
    if !response.status().is_server_error() {
        return Ok(response);
    }

    let (parts, body) = response.into_parts();
    let bytes = body
        .collect()
        .await
        .map_err(TransportError::Transport)?
        .to_bytes();
    Err(TransportError::UpstreamStatus(Box::new(Response::from_parts(parts, bytes))))
}
