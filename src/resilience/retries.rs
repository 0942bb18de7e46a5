//! Retry logic.
//!
//! # Responsibilities
//! - Determine if a request is retryable (idempotent methods only)
//! - Execute retries with exponential backoff
//! - Replay request bodies safely across attempts
//!
//! # Design Decisions
//! - Never retry POST/PATCH (non-idempotent)
//! - Never retry a non-empty one-shot body
//! - Transport errors and 5xx are retryable; 4xx is a final answer
//! - Breaker rejections fail fast; retrying them only burns the budget
//! - The backoff wait is cancellable through the request's token

use bytes::Bytes;
use http::{Method, Request};
use http_body_util::BodyExt;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::{Layer, Service, ServiceExt};

use crate::observability::metrics;
use crate::resilience::backoff::calculate_backoff;
use crate::transport::{
    full_body, BoxFuture, RequestBody, TransportError, UpstreamRequest, UpstreamResponse,
};

/// Retry tuning. Immutable once the chain is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `max_retries + 1`.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// GET, HEAD, PUT, DELETE and OPTIONS.
pub fn is_idempotent(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::PUT | Method::DELETE | Method::OPTIONS
    )
}

/// Tower layer adding bounded retries to an upstream round-tripper.
#[derive(Debug, Clone)]
pub struct RetryLayer {
    upstream: Arc<str>,
    policy: RetryPolicy,
}

impl RetryLayer {
    pub fn new(upstream: impl Into<Arc<str>>, policy: RetryPolicy) -> Self {
        Self {
            upstream: upstream.into(),
            policy,
        }
    }
}

impl<S> Layer<S> for RetryLayer {
    type Service = RetryService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RetryService {
            inner,
            upstream: self.upstream.clone(),
            policy: self.policy.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryService<S> {
    inner: S,
    upstream: Arc<str>,
    policy: RetryPolicy,
}

impl<S> Service<UpstreamRequest> for RetryService<S>
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
        // Consume the instance that was poll_ready'd, leave a fresh clone.
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);
        let upstream = self.upstream.clone();
        let policy = self.policy.clone();

        Box::pin(run_with_retries(inner, upstream, policy, request))
    }
}

async fn run_with_retries<S>(
    mut inner: S,
    upstream: Arc<str>,
    policy: RetryPolicy,
    request: UpstreamRequest,
) -> Result<UpstreamResponse, TransportError>
where
    S: Service<UpstreamRequest, Response = UpstreamResponse, Error = TransportError> + Clone,
{
    let (parts, body) = request.into_parts();
    let cancel = parts.extensions.get::<CancellationToken>().cloned();

    let (mut body, max_attempts) = if body.forbids_replay() || !is_idempotent(&parts.method) {
        (Some(body), 1)
    } else {
        (Some(body.snapshot().await?), policy.max_retries.saturating_add(1))
    };

    let mut attempt = 1u32;
    loop {
        let attempt_body = if attempt < max_attempts {
            body.as_ref().and_then(RequestBody::try_clone)
        } else {
            body.take()
        }
        .unwrap_or_default();

        let request = Request::from_parts(parts.clone(), attempt_body);
        let outcome = match inner.ready().await {
            Ok(svc) => svc.call(request).await,
            Err(e) => Err(e),
        };

        let retryable = match &outcome {
            Ok(response) => response.status().is_server_error(),
            Err(e) => e.is_retryable(),
        };
        if !retryable || attempt >= max_attempts {
            if attempt > 1 || retryable {
                tracing::debug!(
                    upstream = %upstream,
                    method = %parts.method,
                    attempts = attempt,
                    "Retry loop finished"
                );
            }
            return finish(outcome);
        }

        let delay = calculate_backoff(attempt, policy.initial_delay, policy.max_delay);
        tracing::info!(
            upstream = %upstream,
            method = %parts.method,
            uri = %parts.uri,
            attempt,
            delay = ?delay,
            reason = %describe(&outcome),
            "Retrying upstream request"
        );
        discard(outcome).await;
        metrics::record_retry(&upstream);

        match &cancel {
            Some(token) => {
                tokio::select! {
                    _ = token.cancelled() => {
                        tracing::debug!(upstream = %upstream, attempt, "Cancelled during retry backoff");
                        return Err(TransportError::Cancelled);
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            None => tokio::time::sleep(delay).await,
        }

        attempt += 1;
    }
}

/// Surface a 5xx carried as an error as the response the caller sees.
fn finish(outcome: Result<UpstreamResponse, TransportError>) -> Result<UpstreamResponse, TransportError> {
    match outcome {
        Err(TransportError::UpstreamStatus(response)) => Ok(response.map(full_body)),
        other => other,
    }
}

/// Drain and drop a response we are about to replace.
async fn discard(outcome: Result<UpstreamResponse, TransportError>) {
    if let Ok(response) = outcome {
        let _: Result<Bytes, _> = response
            .into_body()
            .collect()
            .await
            .map(|collected| collected.to_bytes());
    }
}

fn describe(outcome: &Result<UpstreamResponse, TransportError>) -> String {
    match outcome {
        Ok(response) => format!("status {}", response.status()),
        Err(e) => e.to_string(),
    }
}
