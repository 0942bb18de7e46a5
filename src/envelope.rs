//! The uniform JSON envelope `{code, status, message, data}`.
//!
//! Every upstream answers with this shape and every inbound request is
//! answered with it. `code` is a service-defined integer, not the HTTP
//! status, but the edge emits it *as* the HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MSG_OK: &str = "ok";
pub const MSG_BAD_REQUEST: &str = "Invalid request parameters";
pub const MSG_UNAUTHORIZED: &str = "Unauthorized";
pub const MSG_NOT_FOUND: &str = "Resource not found";
pub const MSG_INTERNAL: &str = "Internal server error";
pub const MSG_UPSTREAM_FAILED: &str = "Upstream request failed";
pub const MSG_UPSTREAM_UNAVAILABLE: &str = "Upstream service temporarily unavailable";
pub const MSG_INVALID_UPSTREAM_RESPONSE: &str = "Invalid upstream response";
pub const MSG_TIMEOUT: &str = "Request timed out";

/// Envelope status, derived from `code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

impl ResponseStatus {
    pub fn from_code(code: i32) -> Self {
        if (200..300).contains(&code) {
            ResponseStatus::Success
        } else {
            ResponseStatus::Error
        }
    }
}

/// The response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseResponse<T = Value> {
    pub code: i32,
    pub status: ResponseStatus,
    pub message: String,
    #[serde(default)]
    pub data: T,
}

impl<T> BaseResponse<T> {
    pub fn new(code: i32, message: impl Into<String>, data: T) -> Self {
        Self {
            code,
            status: ResponseStatus::from_code(code),
            message: message.into(),
            data,
        }
    }

    pub fn success(data: T) -> Self {
        Self::new(200, MSG_OK, data)
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    /// HTTP status the edge emits for this envelope.
    ///
    /// Codes that are not valid HTTP statuses map to 500.
    pub fn http_status(&self) -> StatusCode {
        u16::try_from(self.code)
            .ok()
            .filter(|code| (100..600).contains(code))
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl BaseResponse<Value> {
    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self::new(code, message, Value::Null)
    }

    /// Fixed envelope synthesized for an empty upstream 401.
    pub fn unauthorized() -> Self {
        Self::error(401, MSG_UNAUTHORIZED)
    }

    pub fn bad_request() -> Self {
        Self::error(400, MSG_BAD_REQUEST)
    }

    pub fn not_found() -> Self {
        Self::error(404, MSG_NOT_FOUND)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::error(500, message)
    }
}

impl<T: Serialize> IntoResponse for BaseResponse<T> {
    fn into_response(self) -> Response {
        let status = self.http_status();
        if i32::from(status.as_u16()) != self.code {
            tracing::warn!(code = self.code, "Envelope code is not an HTTP status, sending 500");
        }
        (status, Json(self)).into_response()
    }
}
