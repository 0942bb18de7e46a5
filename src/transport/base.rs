//! Innermost layer: the pooled hyper client.
//!
//! Applies the per-upstream client deadline and aborts the in-flight call when
//! the request's `CancellationToken` fires.

use bytes::Bytes;
use http_body_util::{combinators::BoxBody, BodyExt};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::Service;

use crate::resilience::timeouts;
use crate::transport::{BoxError, BoxFuture, TransportError, UpstreamRequest, UpstreamResponse};

const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const POOL_MAX_IDLE_PER_HOST: usize = 32;

#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector, BoxBody<Bytes, BoxError>>,
    timeout: Option<Duration>,
}

impl HyperTransport {
    /// `timeout` of `None` (or zero) leaves the call unbounded at this layer.
    pub fn new(timeout: Option<Duration>) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_nodelay(true);
        connector.set_keepalive(Some(Duration::from_secs(60)));

        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .build(connector);

        Self {
            client,
            timeout: timeout.filter(|t| !t.is_zero()),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Service<UpstreamRequest> for HyperTransport {
    type Response = UpstreamResponse;
    type Error = TransportError;
    type Future = BoxFuture<Result<UpstreamResponse, TransportError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: UpstreamRequest) -> Self::Future {
        let client = self.client.clone();
        let timeout = self.timeout;
        let cancel = request.extensions().get::<CancellationToken>().cloned();

        Box::pin(async move {
            if cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                return Err(TransportError::Cancelled);
            }

            let request = request.map(|body| body.into_box_body());
            let send = async {
                let response = client
                    .request(request)
                    .await
                    .map_err(|e| TransportError::Transport(Box::new(e)))?;
                Ok::<_, TransportError>(response.map(|body| body.map_err(|e| Box::new(e) as BoxError).boxed()))
            };
            let bounded = timeouts::enforce_optional(timeout, send);

            match cancel {
                Some(token) => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => Err(TransportError::Cancelled),
                        result = bounded => result,
                    }
                }
                None => bounded.await,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RequestBody;
    use http::Request;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn stalled_backend() -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    tokio::time::sleep(Duration::from_secs(30)).await;
                });
            }
        });
        addr
    }

    async fn ok_backend() -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    let body = r#"{"code":200}"#;
                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        });
        addr
    }

    fn get(addr: std::net::SocketAddr) -> UpstreamRequest {
        Request::get(format!("http://{addr}/ping"))
            .body(RequestBody::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn returns_upstream_response() {
        let addr = ok_backend().await;
        let mut transport = HyperTransport::new(Some(Duration::from_secs(2)));

        let response = transport.call(get(addr)).await.unwrap();
        assert_eq!(response.status(), 200);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"code":200}"#);
    }

    #[tokio::test]
    async fn client_deadline_yields_timeout() {
        let addr = stalled_backend().await;
        let mut transport = HyperTransport::new(Some(Duration::from_millis(100)));

        let err = transport.call(get(addr)).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn cancellation_aborts_in_flight_call() {
        let addr = stalled_backend().await;
        let mut transport = HyperTransport::new(None);

        let token = CancellationToken::new();
        let mut request = get(addr);
        request.extensions_mut().insert(token.clone());

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let err = transport.call(request).await.unwrap_err();
        assert!(matches!(err, TransportError::Cancelled));
    }

    #[tokio::test]
    async fn refused_connection_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut transport = HyperTransport::new(Some(Duration::from_secs(1)));
        let err = transport.call(get(addr)).await.unwrap_err();
        assert!(matches!(err, TransportError::Transport(_)), "got {err:?}");
    }
}
