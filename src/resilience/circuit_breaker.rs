//! Circuit breaker for upstream protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: upstream assumed down, requests fail fast
//! - Half-Open: testing if upstream recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: max_failures consecutive failures
//! Open → Half-Open: first caller after reset_timeout since the last failure
//! Half-Open → Closed: any success
//! Half-Open → Open: any failure
//! ```
//!
//! # Design Decisions
//! - One breaker per upstream (not global, not per request)
//! - Fail fast in Open state (no waiting for timeout)
//! - Admission reads under the shared lock; Open → Half-Open re-checks under
//!   the exclusive lock so exactly one caller performs the transition
//! - State-change callbacks run off the recording path

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::time::Instant;

use crate::observability::metrics;
use crate::resilience::timeouts;
use crate::transport::TransportError;

/// Breaker tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub max_failures: u32,
    /// Time the circuit stays open before a trial call is let through.
    pub reset_timeout: Duration,
    /// Deadline applied by [`CircuitBreaker::execute`].
    pub per_call_timeout: Duration,
    /// Concurrent calls admitted while half-open; `None` admits all.
    pub half_open_max_calls: Option<u32>,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            reset_timeout: Duration::from_secs(30),
            per_call_timeout: Duration::from_secs(5),
            half_open_max_calls: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    /// Gauge encoding: 0 closed, 1 open, 2 half-open.
    pub fn as_gauge(self) -> f64 {
        match self {
            CircuitState::Closed => 0.0,
            CircuitState::Open => 1.0,
            CircuitState::HalfOpen => 2.0,
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => f.write_str("closed"),
            CircuitState::Open => f.write_str("open"),
            CircuitState::HalfOpen => f.write_str("half_open"),
        }
    }
}

/// Callback invoked with `(from, to)` on every transition.
pub type StateChangeCallback = Arc<dyn Fn(CircuitState, CircuitState) + Send + Sync>;

/// Point-in-time view of a breaker, for health reporting.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub max_failures: u32,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    last_failure_at: Option<Instant>,
    last_success_at: Option<Instant>,
    half_open_in_flight: u32,
    /// Bumped on every transition; stale half-open slots compare against it.
    generation: u64,
}

/// Thread-safe three-state circuit breaker.
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: RwLock<BreakerInner>,
    on_state_change: Option<StateChangeCallback>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        metrics::record_breaker_state(&name, CircuitState::Closed);
        Self {
            name,
            config,
            inner: RwLock::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure_at: None,
                last_success_at: None,
                half_open_in_flight: 0,
                generation: 0,
            }),
            on_state_change: None,
        }
    }

    /// Register a transition callback. Panics inside it are contained.
    pub fn with_state_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(CircuitState, CircuitState) + Send + Sync + 'static,
    {
        self.on_state_change = Some(Arc::new(callback));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    pub fn state(&self) -> CircuitState {
        self.read().state
    }

    pub fn failure_count(&self) -> u32 {
        self.read().failure_count
    }

    pub fn last_failure_at(&self) -> Option<Instant> {
        self.read().last_failure_at
    }

    pub fn last_success_at(&self) -> Option<Instant> {
        self.read().last_success_at
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.read();
        BreakerSnapshot {
            name: self.name.clone(),
            state: inner.state,
            failure_count: inner.failure_count,
            max_failures: self.config.max_failures,
        }
    }

    /// Admission check.
    ///
    /// `Ok` in Closed and Half-Open; in Open only once the reset timeout has
    /// elapsed, in which case this caller moves the breaker to Half-Open.
    ///
    /// With `half_open_max_calls` set, a half-open admission holds a
    /// slot until the next transition. Callers of `allow` must report the
    /// outcome; `execute` also frees the slot when its future is dropped.
    pub fn allow(&self) -> Result<(), TransportError> {
        self.admit().map(|_| ())
    }

    /// Admission; `Some(generation)` when a capped half-open slot was taken.
    fn admit(&self) -> Result<Option<u64>, TransportError> {
        {
            let inner = self.read();
            match inner.state {
                CircuitState::Closed => return Ok(None),
                CircuitState::HalfOpen if self.config.half_open_max_calls.is_none() => return Ok(None),
                CircuitState::Open if !self.reset_elapsed(&inner) => {
                    metrics::record_breaker_rejection(&self.name);
                    return Err(TransportError::BreakerOpen);
                }
                _ => {}
            }
        }

        let mut inner = self.write();
        let mut transition = None;
        let state = inner.state;
        match state {
            CircuitState::Closed => return Ok(None),
            CircuitState::Open => {
                // Another caller may have tried and re-opened meanwhile.
                if !self.reset_elapsed(&inner) {
                    drop(inner);
                    metrics::record_breaker_rejection(&self.name);
                    return Err(TransportError::BreakerOpen);
                }
                transition = Some(Self::transition(&mut inner, CircuitState::HalfOpen));
            }
            CircuitState::HalfOpen => {}
        }

        let admitted = match self.config.half_open_max_calls {
            Some(max) if inner.half_open_in_flight >= max => Err(TransportError::BreakerOverloaded),
            Some(_) => {
                inner.half_open_in_flight += 1;
                Ok(Some(inner.generation))
            }
            None => Ok(None),
        };
        drop(inner);

        if let Some((from, to)) = transition {
            self.notify(from, to);
        }

        if admitted.is_err() {
            metrics::record_breaker_rejection(&self.name);
        }
        admitted
    }

    /// Give back a half-open slot whose call never reported an outcome.
    fn release_slot(&self, generation: u64) {
        let mut inner = self.write();
        if inner.state == CircuitState::HalfOpen && inner.generation == generation {
            inner.half_open_in_flight = inner.half_open_in_flight.saturating_sub(1);
        }
    }

    /// Record a successful call. The failure count is always zero afterwards.
    pub fn record_success(&self) {
        let mut inner = self.write();
        inner.last_success_at = Some(Instant::now());
        inner.failure_count = 0;

        let transition = match inner.state {
            CircuitState::HalfOpen => Some(Self::transition(&mut inner, CircuitState::Closed)),
            CircuitState::Closed | CircuitState::Open => None,
        };
        drop(inner);

        if let Some((from, to)) = transition {
            self.notify(from, to);
        }
    }

    /// Record a failed call.
    pub fn record_failure(&self) {
        let mut inner = self.write();
        let now = Instant::now();
        inner.failure_count = inner.failure_count.saturating_add(1);

        let transition = match inner.state {
            CircuitState::Closed => {
                inner.last_failure_at = Some(now);
                (inner.failure_count >= self.config.max_failures)
                    .then(|| Self::transition(&mut inner, CircuitState::Open))
            }
            CircuitState::HalfOpen => {
                inner.last_failure_at = Some(now);
                Some(Self::transition(&mut inner, CircuitState::Open))
            }
            // Stragglers admitted before the trip must not extend the open window.
            CircuitState::Open => None,
        };
        drop(inner);

        if let Some((from, to)) = transition {
            self.notify(from, to);
        }
    }

    /// Admit, run `f` under `per_call_timeout`, and record the outcome.
    pub async fn execute<F, Fut, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<TransportError>,
    {
        let _slot = HalfOpenSlot::new(self, self.admit()?);
        let outcome = timeouts::enforce(self.config.per_call_timeout, f()).await;
        self.record(&outcome);
        outcome
    }

    /// Admit, run `f`, and record the outcome, without adding a deadline.
    ///
    /// For callers whose transport already enforces one.
    pub async fn execute_without_timeout<F, Fut, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<TransportError>,
    {
        let _slot = HalfOpenSlot::new(self, self.admit()?);
        let outcome = f().await;
        self.record(&outcome);
        outcome
    }

    fn record<T, E>(&self, outcome: &Result<T, E>) {
        match outcome {
            Ok(_) => self.record_success(),
            Err(_) => self.record_failure(),
        }
    }

    fn reset_elapsed(&self, inner: &BreakerInner) -> bool {
        inner
            .last_failure_at
            .map_or(true, |at| at.elapsed() > self.config.reset_timeout)
    }

    fn transition(inner: &mut BreakerInner, to: CircuitState) -> (CircuitState, CircuitState) {
        let from = inner.state;
        inner.state = to;
        inner.half_open_in_flight = 0;
        inner.generation = inner.generation.wrapping_add(1);
        if to == CircuitState::Closed {
            inner.failure_count = 0;
        }
        (from, to)
    }

    fn notify(&self, from: CircuitState, to: CircuitState) {
        match to {
            CircuitState::Open => {
                tracing::warn!(upstream = %self.name, %from, %to, "Circuit breaker opened")
            }
            _ => tracing::info!(upstream = %self.name, %from, %to, "Circuit breaker state changed"),
        }
        metrics::record_breaker_state(&self.name, to);

        let Some(callback) = self.on_state_change.clone() else {
            return;
        };
        let name = self.name.clone();
        let run = move || {
            if panic::catch_unwind(AssertUnwindSafe(|| callback(from, to))).is_err() {
                tracing::error!(upstream = %name, "Circuit breaker state-change callback panicked");
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { run() });
            }
            Err(_) => {
                std::thread::spawn(run);
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, BreakerInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BreakerInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Held across an admitted call. A call dropped before its outcome is
/// recorded (request timeout, client gone) frees its half-open slot here;
/// once recorded, the transition has already made the slot stale.
struct HalfOpenSlot<'a> {
    breaker: &'a CircuitBreaker,
    generation: Option<u64>,
}

impl<'a> HalfOpenSlot<'a> {
    fn new(breaker: &'a CircuitBreaker, generation: Option<u64>) -> Self {
        Self { breaker, generation }
    }
}

impl Drop for HalfOpenSlot<'_> {
    fn drop(&mut self) {
        if let Some(generation) = self.generation {
            self.breaker.release_slot(generation);
        }
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("inner", &*self.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    fn breaker(max_failures: u32) -> CircuitBreaker {
        CircuitBreaker::new(
            "test",
            CircuitBreakerConfig {
                max_failures,
                reset_timeout: Duration::from_secs(30),
                per_call_timeout: Duration::from_secs(5),
                half_open_max_calls: None,
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn opens_after_max_consecutive_failures() {
        let cb = breaker(5);
        for _ in 0..4 {
            cb.record_failure();
            assert_eq!(cb.state(), CircuitState::Closed);
        }
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(matches!(cb.allow(), Err(TransportError::BreakerOpen)));
    }

    #[tokio::test(start_paused = true)]
    async fn success_resets_failure_count() {
        let cb = breaker(3);
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        assert_eq!(cb.failure_count(), 0);

        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn open_rejects_until_reset_timeout_elapses() {
        let cb = breaker(1);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(cb.allow().is_err(), "must be strictly greater than reset_timeout");

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(cb.allow().is_ok());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_success_closes() {
        let cb = breaker(1);
        cb.record_failure();
        tokio::time::advance(Duration::from_secs(31)).await;
        cb.allow().unwrap();

        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 0);
        assert!(cb.last_success_at().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_failure_reopens_and_refreshes_timestamp() {
        let cb = breaker(1);
        cb.record_failure();
        let first = cb.last_failure_at().unwrap();

        tokio::time::advance(Duration::from_secs(31)).await;
        cb.allow().unwrap();
        cb.record_failure();

        assert_eq!(cb.state(), CircuitState::Open);
        assert!(cb.last_failure_at().unwrap() > first);
        assert!(cb.allow().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn straggler_failure_does_not_extend_open_window() {
        let cb = breaker(1);
        cb.record_failure();
        let opened_at = cb.last_failure_at().unwrap();

        tokio::time::advance(Duration::from_secs(10)).await;
        cb.record_failure();
        assert_eq!(cb.last_failure_at(), Some(opened_at));
    }

    #[test]
    fn exactly_one_transition_to_half_open() {
        let transitions = Arc::new(AtomicUsize::new(0));
        let seen = transitions.clone();
        let cb = CircuitBreaker::new(
            "race",
            CircuitBreakerConfig {
                max_failures: 1,
                reset_timeout: Duration::from_millis(20),
                ..CircuitBreakerConfig::default()
            },
        )
        .with_state_change(move |_, to| {
            if to == CircuitState::HalfOpen {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });
        let cb = Arc::new(cb);
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(40));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cb = cb.clone();
                std::thread::spawn(move || cb.allow().is_ok())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }

        // No runtime here: callbacks run on their own threads.
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert_eq!(transitions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_limit_reports_overload() {
        let cb = CircuitBreaker::new(
            "limited",
            CircuitBreakerConfig {
                max_failures: 1,
                half_open_max_calls: Some(1),
                ..CircuitBreakerConfig::default()
            },
        );
        cb.record_failure();
        tokio::time::advance(Duration::from_secs(31)).await;

        assert!(cb.allow().is_ok());
        assert!(matches!(cb.allow(), Err(TransportError::BreakerOverloaded)));

        cb.record_success();
        assert!(cb.allow().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_call_frees_its_half_open_slot() {
        let cb = CircuitBreaker::new(
            "abandoned",
            CircuitBreakerConfig {
                max_failures: 1,
                half_open_max_calls: Some(1),
                ..CircuitBreakerConfig::default()
            },
        );
        cb.record_failure();
        tokio::time::advance(Duration::from_secs(31)).await;

        let call = cb.execute_without_timeout(|| std::future::pending::<Result<(), TransportError>>());
        assert!(tokio::time::timeout(Duration::from_millis(10), call).await.is_err());

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert!(cb.allow().is_ok(), "a dropped call must not hold its slot");
        assert!(matches!(cb.allow(), Err(TransportError::BreakerOverloaded)));
    }

    #[tokio::test(start_paused = true)]
    async fn completed_call_does_not_release_a_later_slot() {
        let cb = CircuitBreaker::new(
            "completed",
            CircuitBreakerConfig {
                max_failures: 1,
                half_open_max_calls: Some(1),
                ..CircuitBreakerConfig::default()
            },
        );
        cb.record_failure();
        tokio::time::advance(Duration::from_secs(31)).await;

        // The trial call fails: HalfOpen -> Open, then a fresh half-open window.
        let outcome: Result<(), TransportError> = cb
            .execute_without_timeout(|| async { Err(TransportError::Cancelled) })
            .await;
        assert!(outcome.is_err());
        assert_eq!(cb.state(), CircuitState::Open);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(cb.allow().is_ok());
        assert!(matches!(cb.allow(), Err(TransportError::BreakerOverloaded)));
    }

    #[tokio::test]
    async fn state_change_callback_receives_transitions() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cb = breaker(2).with_state_change(move |from, to| {
            let _ = tx.send((from, to));
        });

        cb.record_failure();
        cb.record_failure();
        assert_eq!(rx.recv().await, Some((CircuitState::Closed, CircuitState::Open)));
    }

    #[tokio::test]
    async fn panicking_callback_does_not_propagate() {
        let cb = breaker(1).with_state_change(|_, _| panic!("boom"));
        cb.record_failure();
        tokio::task::yield_now().await;
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn execute_times_out_and_counts_failure() {
        let cb = breaker(5);
        let outcome: Result<(), TransportError> = cb
            .execute(|| async {
                tokio::time::sleep(Duration::from_secs(6)).await;
                Ok(())
            })
            .await;

        assert!(matches!(outcome, Err(TransportError::Timeout(_))));
        assert_eq!(cb.failure_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn execute_without_timeout_waits_for_slow_call() {
        let cb = breaker(5);
        let outcome: Result<u8, TransportError> = cb
            .execute_without_timeout(|| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(7)
            })
            .await;

        assert_eq!(outcome.unwrap(), 7);
        assert_eq!(cb.failure_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn execute_rejected_when_open_without_calling() {
        let cb = breaker(1);
        cb.record_failure();

        let called = AtomicUsize::new(0);
        let outcome: Result<(), TransportError> = cb
            .execute(|| async {
                called.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await;

        assert!(matches!(outcome, Err(TransportError::BreakerOpen)));
        assert_eq!(called.load(Ordering::SeqCst), 0);
    }
}
