//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid, delays ordered)
//! - Check addresses and prefixes are well formed
//! - Keep each upstream's retry budget inside the edge request timeout
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use crate::config::schema::{GatewayConfig, UpstreamConfig};

/// One failed check, naming the offending key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::new("listener.max_body_bytes", "must be greater than 0"));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new("listener.request_timeout_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    for (name, upstream) in config.upstreams.iter() {
        validate_upstream(name, upstream, &mut errors);
        validate_budget(name, upstream, config.listener.request_timeout(), &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_upstream(name: &str, upstream: &UpstreamConfig, errors: &mut Vec<ValidationError>) {
    let key = |field: &str| format!("upstreams.{name}.{field}");

    if upstream.host.trim().is_empty() {
        errors.push(ValidationError::new(key("host"), "must not be empty"));
    }
    if upstream.port == 0 {
        errors.push(ValidationError::new(key("port"), "must be greater than 0"));
    }
    if !upstream.service_prefix.starts_with('/') {
        errors.push(ValidationError::new(key("service_prefix"), "must start with '/'"));
    }

    let breaker = &upstream.breaker;
    if breaker.max_failures == 0 {
        errors.push(ValidationError::new(key("breaker.max_failures"), "must be at least 1"));
    }
    if breaker.reset_timeout_ms == 0 {
        errors.push(ValidationError::new(key("breaker.reset_timeout_ms"), "must be greater than 0"));
    }
    if breaker.per_call_timeout_ms == 0 {
        errors.push(ValidationError::new(key("breaker.per_call_timeout_ms"), "must be greater than 0"));
    }
    if breaker.half_open_max_calls == Some(0) {
        errors.push(ValidationError::new(key("breaker.half_open_max_calls"), "must be at least 1 when set"));
    }

    let retry = &upstream.retry;
    if retry.initial_delay_ms == 0 {
        errors.push(ValidationError::new(key("retry.initial_delay_ms"), "must be greater than 0"));
    }
    if retry.initial_delay_ms > retry.max_delay_ms {
        errors.push(ValidationError::new(
            key("retry.max_delay_ms"),
            "must not be smaller than initial_delay_ms",
        ));
    }
}

/// The edge timeout must outlast the slowest retry sequence, or a call is cut
/// off while its breaker and retry loop still consider it live.
fn validate_budget(
    name: &str,
    upstream: &UpstreamConfig,
    request_timeout: Duration,
    errors: &mut Vec<ValidationError>,
) {
    if request_timeout.is_zero() {
        return;
    }
    let worst_case = upstream.worst_case_duration();
    if worst_case >= request_timeout {
        errors.push(ValidationError::new(
            format!("upstreams.{name}.timeout_secs"),
            format!(
                "worst case of {worst_case:?} across retries does not fit in listener.request_timeout_secs ({request_timeout:?})"
            ),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_error() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".to_string();
        config.upstreams.crm.host = String::new();
        config.upstreams.crm.service_prefix = "crm-service".to_string();
        config.upstreams.task.breaker.max_failures = 0;
        config.upstreams.task.retry.initial_delay_ms = 5_000;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "upstreams.crm.host",
                "upstreams.crm.service_prefix",
                "upstreams.task.breaker.max_failures",
                "upstreams.task.retry.max_delay_ms",
            ]
        );
    }

    #[test]
    fn retry_budget_must_fit_request_timeout() {
        let mut config = GatewayConfig::default();
        config.upstreams.crm.timeout_secs = 10;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "upstreams.crm.timeout_secs");

        // A longer edge timeout accepts the same upstream.
        config.listener.request_timeout_secs = 31;
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn retry_budget_without_client_deadline_uses_per_call_timeout() {
        let mut config = GatewayConfig::default();
        config.listener.request_timeout_secs = 10;
        for upstream in [
            &mut config.upstreams.account,
            &mut config.upstreams.crm,
            &mut config.upstreams.logistics,
            &mut config.upstreams.purchase,
            &mut config.upstreams.task,
        ] {
            upstream.timeout_secs = 0;
            upstream.breaker.per_call_timeout_ms = 3_000;
        }
        // 3 x 3s + 300ms
        assert_eq!(validate_config(&config), Ok(()));

        config.upstreams.purchase.retry.max_retries = 3;
        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["upstreams.purchase.timeout_secs"]);
    }

    #[test]
    fn metrics_address_ignored_when_disabled() {
        let mut config = GatewayConfig::default();
        config.observability.metrics_enabled = false;
        config.observability.metrics_address = "nowhere".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
