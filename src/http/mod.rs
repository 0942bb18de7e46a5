//! Edge HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → middleware/ (metrics, request timeout) + auth context
//!     → extract.rs (validated Path / Query / Json)
//!     → handlers/ (one adapter call per request)
//!     → envelope emitted with HTTP status = envelope code
//!     → error.rs (adapter errors → fixed envelopes)
//! ```

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, HttpServer};
