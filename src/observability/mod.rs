//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms via the metrics facade)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint
//! ```
//!
//! # Design Decisions
//! - Request ID flows in from the edge and out to every upstream call
//! - Metrics are cheap (atomic increments) and safe to record before init
//! - Request and response bodies are never logged

pub mod logging;
pub mod metrics;
