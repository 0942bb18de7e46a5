//! Per-request context value.
//!
//! A `RequestContext` travels with a single inbound request from the edge
//! middleware down to the transport chain. It carries:
//! - a cancellation token, cancelled when the inbound request goes away
//! - a typed value map, keyed by type, for request-scoped data
//!
//! Values are keyed by their Rust type, so a module that keeps its key type
//! private owns the slot: nothing else can read or replace it.
//! Contexts are never mutated in place; `with_value` returns a new context.

use http::Extensions;
use tokio_util::sync::CancellationToken;

/// Request-scoped context: cancellation plus typed values.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    values: Extensions,
}

impl RequestContext {
    /// Create a detached context with its own cancellation token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context driven by an existing cancellation token.
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            values: Extensions::new(),
        }
    }

    /// Token cancelled when the owning request is abandoned.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancel every in-flight call made with this context.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Return a new context carrying `value` in addition to existing ones.
    ///
    /// The cancellation token is shared with `self`.
    pub fn with_value<T>(&self, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut next = self.clone();
        next.values.insert(value);
        next
    }

    /// Look up a value by type.
    pub fn value<T>(&self) -> Option<&T>
    where
        T: Send + Sync + 'static,
    {
        self.values.get::<T>()
    }
}
