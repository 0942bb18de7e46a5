//! Edge middleware that builds the per-request context.

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{request::Parts, Request},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use tokio_util::sync::CancellationToken;

use crate::auth::carrier::{attach, AuthContext};
use crate::context::RequestContext;

/// Attach a [`RequestContext`] carrying the caller's [`AuthContext`].
///
/// The context's token is cancelled when this future completes or is
/// dropped (client disconnect, request timeout), which aborts any upstream
/// call still running on behalf of the request.
pub async fn auth_context_middleware(mut request: Request<Body>, next: Next) -> Response {
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let auth = AuthContext::from_headers(request.headers());
    tracing::trace!(has_token = auth.has_token(), "Auth context attached");

    let ctx = attach(&RequestContext::with_cancellation(cancel), auth);
    request.extensions_mut().insert(ctx);

    next.run(request).await
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Routes mounted without the middleware get an anonymous context.
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default())
    }
}
