//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, --config / GATEWAY_CONFIG)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → one ResilientTransport per upstream, built at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All tables have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    BreakerConfig, GatewayConfig, ListenerConfig, LogFormat, ObservabilityConfig, RetryConfig,
    UpstreamConfig, UpstreamsConfig,
};
