//! Edge HTTP gateway library.
//!
//! One REST surface over five backends (account, crm, logistics, purchase,
//! task). Every upstream call goes through a per-upstream resilient chain
//! `Retry → CircuitBreaker → hyper`, and every answer is the envelope
//! `{code, status, message, data}`.

// Request-scoped state
pub mod auth;
pub mod context;

// Upstream call path
pub mod client;
pub mod resilience;
pub mod transport;
pub mod upstream;

// Edge
pub mod envelope;
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use envelope::BaseResponse;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use upstream::Upstreams;
