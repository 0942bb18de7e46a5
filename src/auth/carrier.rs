//! Attaching and reading the caller's credentials on a request context.

use http::header::{HeaderMap, AUTHORIZATION};
use std::sync::Arc;

use crate::context::RequestContext;

/// Inbound headers worth forwarding to upstreams alongside the token.
pub const FORWARDED_HEADERS: [&str; 4] = [
    "x-request-id",
    "x-correlation-id",
    "traceparent",
    "tracestate",
];

/// The caller's bearer token and forwardable inbound headers.
///
/// Fields are private: once built, an `AuthContext` cannot change.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    access_token: String,
    inbound_headers: HeaderMap,
}

impl AuthContext {
    pub fn new(access_token: impl Into<String>, inbound_headers: HeaderMap) -> Self {
        Self {
            access_token: access_token.into(),
            inbound_headers,
        }
    }

    /// Build from inbound request headers.
    ///
    /// Only the `Bearer` scheme is recognized; any other `Authorization`
    /// value is treated as no token. Correlation and trace headers listed in
    /// [`FORWARDED_HEADERS`] are kept, everything else is dropped.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let access_token = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_bearer)
            .unwrap_or_default();

        let mut inbound_headers = HeaderMap::new();
        for name in FORWARDED_HEADERS {
            for value in headers.get_all(name) {
                inbound_headers.append(name, value.clone());
            }
        }

        Self {
            access_token,
            inbound_headers,
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn has_token(&self) -> bool {
        !self.access_token.is_empty()
    }

    pub fn inbound_headers(&self) -> &HeaderMap {
        &self.inbound_headers
    }
}

fn parse_bearer(value: &str) -> Option<String> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

// Private key type: the only way to reach the slot is through this module.
#[derive(Clone)]
struct AuthSlot(Arc<AuthContext>);

/// Return a context carrying `auth`.
pub fn attach(ctx: &RequestContext, auth: AuthContext) -> RequestContext {
    ctx.with_value(AuthSlot(Arc::new(auth)))
}

/// Read the attached auth context, if any.
pub fn read(ctx: &RequestContext) -> Option<&AuthContext> {
    ctx.value::<AuthSlot>().map(|slot| slot.0.as_ref())
}
