//! JSON codec client over the resilient transport.
//!
//! # Data Flow
//! ```text
//! adapter method
//!     → api.rs (BaseApiClient: url, body encode, outbound headers)
//!     → transport::ResilientTransport
//!     → response.rs (HttpResponse, body fully drained)
//!     → envelope decode
//! ```

pub mod api;
pub mod error;
pub mod response;
pub mod url;

pub use api::BaseApiClient;
pub use error::ClientError;
pub use response::HttpResponse;
pub use self::url::QueryParams;
