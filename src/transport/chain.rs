//! Per-upstream composition of the resilient transport.

use std::sync::Arc;
use tower::{Service, ServiceBuilder};

use crate::config::UpstreamConfig;
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig, RetryLayer, RetryPolicy};
use crate::transport::{
    BoxFuture, CircuitBreakerLayer, HyperTransport, RoundTripper, TransportError, UpstreamRequest,
    UpstreamResponse,
};

/// Retry → CircuitBreaker → base, built once per upstream and shared.
///
/// Cloning is cheap; every clone observes the same breaker.
#[derive(Clone)]
pub struct ResilientTransport {
    name: Arc<str>,
    breaker: Arc<CircuitBreaker>,
    transport: Arc<dyn RoundTripper>,
}

impl ResilientTransport {
    pub fn new(name: &str, config: &UpstreamConfig) -> Self {
        let base = HyperTransport::new(config.client_timeout());
        // With no client deadline the breaker's per-call timeout bounds each attempt.
        let breaker_owns_deadline = base.timeout().is_none();
        Self::with_base(
            name,
            config.breaker.to_breaker_config(),
            config.retry.to_retry_policy(),
            base,
            breaker_owns_deadline,
        )
    }

    /// Compose the chain over any base service.
    pub fn with_base<B>(
        name: &str,
        breaker_config: CircuitBreakerConfig,
        retry_policy: RetryPolicy,
        base: B,
        breaker_owns_deadline: bool,
    ) -> Self
    where
        B: Service<UpstreamRequest, Response = UpstreamResponse, Error = TransportError>
            + Clone
            + Send
            + Sync
            + 'static,
        B::Future: Send + 'static,
    {
        let name: Arc<str> = Arc::from(name);
        let breaker = Arc::new(CircuitBreaker::new(name.as_ref(), breaker_config));

        let breaker_layer = if breaker_owns_deadline {
            CircuitBreakerLayer::with_call_timeout(breaker.clone())
        } else {
            CircuitBreakerLayer::new(breaker.clone())
        };

        let service = ServiceBuilder::new()
            .layer(RetryLayer::new(name.clone(), retry_policy))
            .layer(breaker_layer)
            .service(base);

        Self {
            name,
            breaker,
            transport: Arc::new(service),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn round_trip(&self, request: UpstreamRequest) -> BoxFuture<Result<UpstreamResponse, TransportError>> {
        self.transport.round_trip(request)
    }
}

impl std::fmt::Debug for ResilientTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientTransport")
            .field("name", &self.name)
            .field("breaker", &self.breaker.snapshot())
            .finish_non_exhaustive()
    }
}
