//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream call:
//!     → retries.rs (idempotent methods only, bounded attempts)
//!         → backoff.rs (delay before the next attempt)
//!     → circuit_breaker.rs (admission, failure accounting per upstream)
//!         → timeouts.rs (per-call deadline)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Retries only for idempotent requests (GET, HEAD, PUT, DELETE, OPTIONS)
//! - Circuit breaker prevents cascading failures; one breaker per upstream
//! - 4xx is a healthy answer: never retried, never a breaker failure

pub mod backoff;
pub mod circuit_breaker;
pub mod retries;
pub mod timeouts;

pub use circuit_breaker::{BreakerSnapshot, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use retries::{is_idempotent, RetryLayer, RetryPolicy, RetryService};
