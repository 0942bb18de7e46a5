//! Auth-context carrier.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → middleware.rs (read Authorization + correlation headers)
//!     → carrier.rs (attach AuthContext to the RequestContext)
//!     → handler → adapter
//!     → headers.rs (outbound headers for the upstream call)
//! ```
//!
//! # Design Decisions
//! - The bearer token is never stored outside the request's context
//! - The context slot is keyed by a private type; only this module reads it
//! - An attached AuthContext is immutable (shared behind `Arc`)

pub mod carrier;
pub mod headers;
pub mod middleware;

pub use carrier::{attach, read, AuthContext};
pub use headers::outbound_headers;
pub use middleware::auth_context_middleware;
