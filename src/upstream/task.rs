//! task-service: tasks.

use serde::{Deserialize, Serialize};

use crate::client::BaseApiClient;
use crate::context::RequestContext;
use crate::upstream::{envelope, AdapterResult, QueryBuilder};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTaskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTaskStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TaskListQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TaskAdapter {
    client: BaseApiClient,
}

impl TaskAdapter {
    pub fn new(client: BaseApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &BaseApiClient {
        &self.client
    }

    pub async fn list(&self, ctx: &RequestContext, query: &TaskListQuery) -> AdapterResult {
        let query = QueryBuilder::new()
            .opt("page", query.page)
            .opt("page_size", query.page_size)
            .opt("status", query.status.as_deref())
            .opt("assignee_id", query.assignee_id.as_deref())
            .build();
        envelope(self.client.get_with_query(ctx, "/api/v1/tasks", &query).await?)
    }

    pub async fn get(&self, ctx: &RequestContext, id: &str) -> AdapterResult {
        envelope(self.client.get(ctx, &format!("/api/v1/tasks/{id}")).await?)
    }

    pub async fn create(&self, ctx: &RequestContext, body: &CreateTaskRequest) -> AdapterResult {
        envelope(self.client.post(ctx, "/api/v1/tasks", body).await?)
    }

    pub async fn update(&self, ctx: &RequestContext, id: &str, body: &UpdateTaskRequest) -> AdapterResult {
        envelope(self.client.put(ctx, &format!("/api/v1/tasks/{id}"), body).await?)
    }

    pub async fn update_status(&self, ctx: &RequestContext, id: &str, body: &UpdateTaskStatusRequest) -> AdapterResult {
        envelope(self.client.patch(ctx, &format!("/api/v1/tasks/{id}/status"), body).await?)
    }

    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> AdapterResult {
        envelope(self.client.delete(ctx, &format!("/api/v1/tasks/{id}")).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{self, AuthContext};
    use crate::resilience::{CircuitBreakerConfig, RetryPolicy};
    use crate::transport::{full_body, ResilientTransport, TransportError, UpstreamRequest};
    use bytes::Bytes;
    use http::{HeaderMap, Response};
    use std::sync::{Arc, Mutex};

    fn adapter(status: u16, body: &'static str, seen: Arc<Mutex<Vec<String>>>) -> TaskAdapter {
        let base = tower::service_fn(move |request: UpstreamRequest| {
            seen.lock().unwrap().push(format!("{} {}", request.method(), request.uri()));
            async move {
                Ok::<_, TransportError>(
                    Response::builder()
                        .status(status)
                        .body(full_body(Bytes::from_static(body.as_bytes())))
                        .unwrap(),
                )
            }
        });
        let transport = ResilientTransport::with_base(
            "task",
            CircuitBreakerConfig::default(),
            RetryPolicy::disabled(),
            base,
            false,
        );
        TaskAdapter::new(BaseApiClient::new("http://task.test:8005/task-service", transport).unwrap())
    }

    fn ctx() -> RequestContext {
        auth::attach(&RequestContext::new(), AuthContext::new("t", HeaderMap::new()))
    }

    #[tokio::test]
    async fn list_omits_empty_filters() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let tasks = adapter(200, r#"{"code":200,"status":"success","message":"ok","data":[]}"#, seen.clone());

        let query = TaskListQuery {
            status: Some(String::new()),
            assignee_id: Some("u7".to_string()),
            ..Default::default()
        };
        let envelope = tasks.list(&ctx(), &query).await.unwrap();
        assert_eq!(envelope.code, 200);
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            ["GET http://task.test:8005/task-service/api/v1/tasks?assignee_id=u7"]
        );
    }

    #[tokio::test]
    async fn error_envelope_is_not_an_error() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let tasks = adapter(404, r#"{"code":404,"status":"error","message":"task not found","data":null}"#, seen);

        let envelope = tasks.get(&ctx(), "missing").await.unwrap();
        assert_eq!(envelope.code, 404);
        assert_eq!(envelope.message, "task not found");
    }

    #[tokio::test]
    async fn undecodable_body_is_an_error() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let tasks = adapter(200, "not json", seen);

        let err = tasks.delete(&ctx(), "t1").await.unwrap_err();
        assert!(matches!(err, crate::client::ClientError::Decode { status: 200, .. }));
    }
}
