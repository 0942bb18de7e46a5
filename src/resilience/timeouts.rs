//! Timeout enforcement.
//!
//! Timeout errors are distinct from other transport errors so callers can
//! tell a slow upstream from a dead one.

use std::future::Future;
use std::time::Duration;

use crate::transport::TransportError;

/// Run `fut` under `limit`; elapsed maps to [`TransportError::Timeout`].
///
/// The future is dropped on expiry, which cancels the in-flight I/O.
pub async fn enforce<F, T, E>(limit: Duration, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<TransportError>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(outcome) => outcome,
        Err(_) => Err(TransportError::Timeout(limit).into()),
    }
}

/// Like [`enforce`], but a `None` limit leaves the future unbounded.
pub async fn enforce_optional<F, T, E>(limit: Option<Duration>, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<TransportError>,
{
    match limit {
        Some(limit) => enforce(limit, fut).await,
        None => fut.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn elapsed_deadline_is_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, TransportError>(())
        };
        let err = enforce(Duration::from_secs(1), slow).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout(d) if d == Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn unbounded_when_no_limit() {
        let outcome = enforce_optional(None, async { Ok::<_, TransportError>(5) }).await;
        assert_eq!(outcome.unwrap(), 5);
    }
}
