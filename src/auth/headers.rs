//! Outbound header construction.

use http::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};

use crate::auth::carrier::AuthContext;

const APPLICATION_JSON: &str = "application/json";

/// Headers for an upstream call made on behalf of `auth`.
///
/// Always JSON content negotiation; `Authorization: Bearer <token>` only when
/// a non-empty token is present. Correlation headers captured from the
/// inbound request are forwarded as-is.
pub fn outbound_headers(auth: Option<&AuthContext>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));

    let Some(auth) = auth else {
        return headers;
    };

    for (name, value) in auth.inbound_headers() {
        headers.append(name.clone(), value.clone());
    }

    if auth.has_token() {
        match HeaderValue::from_str(&format!("Bearer {}", auth.access_token())) {
            Ok(value) => {
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => {
                tracing::warn!("Dropping bearer token with invalid header characters");
            }
        }
    }

    headers
}
