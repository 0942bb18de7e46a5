//! `BaseApiClient`: JSON over the resilient transport.
//!
//! One client per upstream, shared by all adapters of that upstream. Each
//! call serializes the body, stamps outbound headers from the request's
//! auth context, runs the chain and drains the response body before
//! returning, whatever the status.

use bytes::Bytes;
use http::{Method, Request};
use http_body_util::BodyExt;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::auth;
use crate::client::error::ClientError;
use crate::client::response::HttpResponse;
use crate::client::url::{compose, QueryParams};
use crate::context::RequestContext;
use crate::observability::metrics;
use crate::transport::{RequestBody, ResilientTransport, TransportError};

#[derive(Debug, Clone)]
pub struct BaseApiClient {
    base_url: Arc<str>,
    transport: ResilientTransport,
}

impl BaseApiClient {
    /// `base_url` is `http://host:port/service-prefix`, without a trailing slash.
    pub fn new(base_url: impl Into<String>, transport: ResilientTransport) -> Result<Self, ClientError> {
        let base_url = base_url.into();
        url::Url::parse(&base_url).map_err(|source| ClientError::InvalidUrl {
            url: base_url.clone(),
            source,
        })?;
        Ok(Self {
            base_url: Arc::from(base_url.trim_end_matches('/')),
            transport,
        })
    }

    pub fn upstream(&self) -> &str {
        self.transport.name()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &ResilientTransport {
        &self.transport
    }

    pub fn build_url(&self, path: &str, query: Option<&QueryParams>) -> String {
        compose(&self.base_url, path, query)
    }

    pub async fn get(&self, ctx: &RequestContext, path: &str) -> Result<HttpResponse, ClientError> {
        self.do_request(ctx, Method::GET, self.build_url(path, None), None).await
    }

    pub async fn get_with_query(
        &self,
        ctx: &RequestContext,
        path: &str,
        query: &QueryParams,
    ) -> Result<HttpResponse, ClientError> {
        self.do_request(ctx, Method::GET, self.build_url(path, Some(query)), None).await
    }

    pub async fn post<B>(&self, ctx: &RequestContext, path: &str, body: &B) -> Result<HttpResponse, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let body = encode(body)?;
        self.do_request(ctx, Method::POST, self.build_url(path, None), Some(body)).await
    }

    /// POST with a query string and an optional body.
    pub async fn post_with_query<B>(
        &self,
        ctx: &RequestContext,
        path: &str,
        query: &QueryParams,
        body: Option<&B>,
    ) -> Result<HttpResponse, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let body = body.map(encode).transpose()?;
        self.do_request(ctx, Method::POST, self.build_url(path, Some(query)), body).await
    }

    pub async fn put<B>(&self, ctx: &RequestContext, path: &str, body: &B) -> Result<HttpResponse, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let body = encode(body)?;
        self.do_request(ctx, Method::PUT, self.build_url(path, None), Some(body)).await
    }

    pub async fn put_with_query<B>(
        &self,
        ctx: &RequestContext,
        path: &str,
        query: &QueryParams,
        body: &B,
    ) -> Result<HttpResponse, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let body = encode(body)?;
        self.do_request(ctx, Method::PUT, self.build_url(path, Some(query)), Some(body)).await
    }

    pub async fn patch<B>(&self, ctx: &RequestContext, path: &str, body: &B) -> Result<HttpResponse, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let body = encode(body)?;
        self.do_request(ctx, Method::PATCH, self.build_url(path, None), Some(body)).await
    }

    pub async fn delete(&self, ctx: &RequestContext, path: &str) -> Result<HttpResponse, ClientError> {
        self.do_request(ctx, Method::DELETE, self.build_url(path, None), None).await
    }

    pub async fn delete_with_query(
        &self,
        ctx: &RequestContext,
        path: &str,
        query: &QueryParams,
    ) -> Result<HttpResponse, ClientError> {
        self.do_request(ctx, Method::DELETE, self.build_url(path, Some(query)), None).await
    }

    /// Send one request through the chain and read the whole response.
    pub async fn do_request(
        &self,
        ctx: &RequestContext,
        method: Method,
        url: String,
        body: Option<Bytes>,
    ) -> Result<HttpResponse, ClientError> {
        let mut builder = Request::builder().method(method.clone()).uri(url.as_str());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(auth::outbound_headers(auth::read(ctx)));
        }
        let mut request = builder.body(body.map(RequestBody::from_bytes).unwrap_or_default())?;
        request.extensions_mut().insert(ctx.cancellation_token().clone());

        let start = Instant::now();
        let result = self.send(ctx, request).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(response) => {
                tracing::info!(
                    upstream = %self.upstream(),
                    method = %method,
                    url = %url,
                    status_code = response.status,
                    duration_ms,
                    response_size = response.body.len(),
                    "Upstream call completed"
                );
                metrics::record_upstream_call(self.upstream(), method.as_str(), &response.status.to_string(), start);
            }
            Err(e) => {
                tracing::warn!(
                    upstream = %self.upstream(),
                    method = %method,
                    url = %url,
                    duration_ms,
                    error = %e,
                    "Upstream call failed"
                );
                metrics::record_upstream_call(self.upstream(), method.as_str(), "error", start);
            }
        }

        result
    }

    async fn send(
        &self,
        ctx: &RequestContext,
        request: Request<RequestBody>,
    ) -> Result<HttpResponse, ClientError> {
        let response = self.transport.round_trip(request).await?;
        let (parts, body) = response.into_parts();

        let token = ctx.cancellation_token();
        let collected = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(TransportError::Cancelled.into()),
            collected = body.collect() => collected.map_err(TransportError::Transport)?,
        };

        Ok(HttpResponse {
            status: parts.status.as_u16(),
            headers: parts.headers,
            body: collected.to_bytes(),
        })
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Bytes, ClientError> {
    serde_json::to_vec(body)
        .map(Bytes::from)
        .map_err(ClientError::Serialization)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthContext;
    use crate::resilience::{CircuitBreakerConfig, RetryPolicy};
    use crate::transport::{full_body, BoxFuture, UpstreamRequest, UpstreamResponse};
    use http::header::{AUTHORIZATION, CONTENT_TYPE};
    use http::{HeaderMap, Response};
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::task::{Context, Poll};

    #[derive(Debug, Clone)]
    struct Seen {
        method: Method,
        uri: String,
        headers: HeaderMap,
        body: Bytes,
    }

    /// Records each request and answers with a fixed status and body.
    #[derive(Clone)]
    struct Recorder {
        seen: Arc<Mutex<Vec<Seen>>>,
        status: u16,
        body: &'static str,
    }

    impl tower::Service<UpstreamRequest> for Recorder {
        type Response = UpstreamResponse;
        type Error = TransportError;
        type Future = BoxFuture<Result<UpstreamResponse, TransportError>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, request: UpstreamRequest) -> Self::Future {
            let seen = self.seen.clone();
            let status = self.status;
            let body = self.body;
            Box::pin(async move {
                let (parts, req_body) = request.into_parts();
                let bytes = req_body.into_box_body().collect().await.unwrap().to_bytes();
                seen.lock().unwrap().push(Seen {
                    method: parts.method,
                    uri: parts.uri.to_string(),
                    headers: parts.headers,
                    body: bytes,
                });
                Ok(Response::builder()
                    .status(status)
                    .body(full_body(Bytes::from_static(body.as_bytes())))
                    .unwrap())
            })
        }
    }

    fn client(status: u16, body: &'static str) -> (BaseApiClient, Arc<Mutex<Vec<Seen>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let transport = ResilientTransport::with_base(
            "crm",
            CircuitBreakerConfig::default(),
            RetryPolicy::disabled(),
            Recorder {
                seen: seen.clone(),
                status,
                body,
            },
            false,
        );
        (BaseApiClient::new("http://crm.test:8002/crm-service", transport).unwrap(), seen)
    }

    fn authed() -> RequestContext {
        auth::attach(&RequestContext::new(), AuthContext::new("tok-123", HeaderMap::new()))
    }

    #[test]
    fn rejects_invalid_base_url() {
        let transport = ResilientTransport::with_base(
            "crm",
            CircuitBreakerConfig::default(),
            RetryPolicy::disabled(),
            Recorder {
                seen: Arc::default(),
                status: 200,
                body: "{}",
            },
            false,
        );
        let err = BaseApiClient::new("not a url", transport).unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn post_sends_json_with_bearer() {
        let (client, seen) = client(201, r#"{"code":201,"status":"success","message":"created","data":{"id":"c1"}}"#);

        let response = client
            .post(&authed(), "/api/v1/customers", &serde_json::json!({"name": "Acme"}))
            .await
            .unwrap();
        assert_eq!(response.status, 201);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, Method::POST);
        assert_eq!(seen[0].uri, "http://crm.test:8002/crm-service/api/v1/customers");
        assert_eq!(seen[0].headers[AUTHORIZATION], "Bearer tok-123");
        assert_eq!(seen[0].headers[CONTENT_TYPE], "application/json");
        assert_eq!(&seen[0].body[..], br#"{"name":"Acme"}"#);
    }

    #[tokio::test]
    async fn query_is_encoded_and_get_has_no_body() {
        let (client, seen) = client(200, r#"{"code":200,"status":"success","message":"ok","data":[]}"#);
        let query: QueryParams = BTreeMap::from([("page".to_string(), "1".to_string())]);

        client.get_with_query(&RequestContext::new(), "/api/v1/leads", &query).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].uri, "http://crm.test:8002/crm-service/api/v1/leads?page=1");
        assert!(seen[0].body.is_empty());
        assert!(seen[0].headers.get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn non_2xx_body_is_drained_and_returned() {
        let (client, _) = client(404, r#"{"code":404,"status":"error","message":"missing","data":null}"#);

        let response = client.get(&RequestContext::new(), "/api/v1/customers/x").await.unwrap();
        assert!(!response.is_success());
        assert_eq!(response.decode_envelope::<serde_json::Value>().unwrap().message, "missing");
    }

    #[tokio::test]
    async fn serialization_failure_sends_nothing() {
        struct Unserializable;
        impl Serialize for Unserializable {
            fn serialize<S: serde::Serializer>(&self, _s: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("nope"))
            }
        }

        let (client, seen) = client(200, "{}");
        let err = client
            .post(&RequestContext::new(), "/api/v1/customers", &Unserializable)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Serialization(_)));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancelled_context_fails_with_cancelled() {
        let (client, _) = client(200, "{}");
        let ctx = RequestContext::new();
        ctx.cancel();

        let err = client.get(&ctx, "/api/v1/customers").await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(TransportError::Cancelled)));
    }
}
