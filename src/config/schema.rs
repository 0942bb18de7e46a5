//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from the TOML file.
//! Every table has defaults so a missing file or a partial file still yields
//! a runnable gateway pointed at local upstreams.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::resilience::backoff::calculate_backoff;
use crate::resilience::{CircuitBreakerConfig, RetryPolicy};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Inbound listener settings.
    pub listener: ListenerConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// One entry per backend service.
    pub upstreams: UpstreamsConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,

    /// Total time budget for one inbound request, in seconds.
    pub request_timeout_secs: u64,
}

impl ListenerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// The five backends behind the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamsConfig {
    pub account: UpstreamConfig,
    pub crm: UpstreamConfig,
    pub logistics: UpstreamConfig,
    pub purchase: UpstreamConfig,
    pub task: UpstreamConfig,
}

impl UpstreamsConfig {
    /// `(name, config)` pairs in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &UpstreamConfig)> {
        [
            ("account", &self.account),
            ("crm", &self.crm),
            ("logistics", &self.logistics),
            ("purchase", &self.purchase),
            ("task", &self.task),
        ]
        .into_iter()
    }
}

impl Default for UpstreamsConfig {
    fn default() -> Self {
        Self {
            account: UpstreamConfig::local(8001, "/account-service"),
            crm: UpstreamConfig::local(8002, "/crm-service"),
            logistics: UpstreamConfig::local(8003, "/logistics-service"),
            purchase: UpstreamConfig::local(8004, "/purchase-service"),
            task: UpstreamConfig::local(8005, "/task-service"),
        }
    }
}

/// A single backend service.
///
/// When the table is present in the file, `host`, `port` and
/// `service_prefix` are required.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    pub host: String,

    pub port: u16,

    /// Path prefix the service is mounted under (e.g., "/crm-service").
    pub service_prefix: String,

    /// Client deadline per attempt in seconds; 0 leaves it to the breaker.
    #[serde(default = "default_upstream_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub breaker: BreakerConfig,

    #[serde(default)]
    pub retry: RetryConfig,
}

/// Three attempts at this bound plus backoff fit inside the default edge timeout.
fn default_upstream_timeout_secs() -> u64 {
    5
}

impl UpstreamConfig {
    pub fn local(port: u16, service_prefix: &str) -> Self {
        Self {
            host: "localhost".to_string(),
            port,
            service_prefix: service_prefix.to_string(),
            timeout_secs: default_upstream_timeout_secs(),
            breaker: BreakerConfig::default(),
            retry: RetryConfig::default(),
        }
    }

    /// `http://<host>:<port><service_prefix>`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.service_prefix)
    }

    pub fn client_timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Longest an idempotent call can spend in the chain: every attempt runs
    /// to its deadline and every backoff is waited out.
    pub fn worst_case_duration(&self) -> Duration {
        let attempt = self
            .client_timeout()
            .unwrap_or(Duration::from_millis(self.breaker.per_call_timeout_ms));
        let retries = self.retry.max_retries;
        let initial = Duration::from_millis(self.retry.initial_delay_ms);
        let max = Duration::from_millis(self.retry.max_delay_ms);

        let attempts = attempt.saturating_mul(retries.saturating_add(1));
        (1..=retries)
            .map(|n| calculate_backoff(n, initial, max))
            .fold(attempts, Duration::saturating_add)
    }
}

/// Circuit breaker settings for one upstream.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub max_failures: u32,

    /// Time in Open before a trial call is admitted, in milliseconds.
    pub reset_timeout_ms: u64,

    /// Per-attempt bound used when the client has no deadline, in milliseconds.
    pub per_call_timeout_ms: u64,

    /// Concurrent trial calls admitted while half-open. Unlimited when absent.
    pub half_open_max_calls: Option<u32>,
}

impl BreakerConfig {
    pub fn to_breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            max_failures: self.max_failures,
            reset_timeout: Duration::from_millis(self.reset_timeout_ms),
            per_call_timeout: Duration::from_millis(self.per_call_timeout_ms),
            half_open_max_calls: self.half_open_max_calls,
        }
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            reset_timeout_ms: 30_000,
            per_call_timeout_ms: 5_000,
            half_open_max_calls: None,
        }
    }
}

/// Retry settings for one upstream.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds; doubles per retry.
    pub initial_delay_ms: u64,

    /// Cap on the backoff delay in milliseconds.
    pub max_delay_ms: u64,
}

impl RetryConfig {
    pub fn to_retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 100,
            max_delay_ms: 2_000,
        }
    }
}
