//! `/api/v1/tasks` → task-service.

use axum::{
    extract::State,
    routing::{get, patch},
    Router,
};

use crate::context::RequestContext;
use crate::envelope::BaseResponse;
use crate::http::error::ApiError;
use crate::http::extract::{check_paging, optional_non_blank, require_non_blank, Validate, ValidId, ValidJson, ValidQuery};
use crate::http::server::AppState;
use crate::upstream::task::{CreateTaskRequest, TaskListQuery, UpdateTaskRequest, UpdateTaskStatusRequest};

const PRIORITIES: [&str; 4] = ["low", "medium", "high", "urgent"];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/tasks", get(list_tasks).post(create_task))
        .route("/api/v1/tasks/{id}", get(get_task).put(update_task).delete(delete_task))
        .route("/api/v1/tasks/{id}/status", patch(update_task_status))
}

fn check_priority(priority: Option<&str>) -> Result<(), String> {
    match priority {
        Some(p) if !PRIORITIES.contains(&p) => Err(format!("priority must be one of {}", PRIORITIES.join(", "))),
        _ => Ok(()),
    }
}

impl Validate for TaskListQuery {
    fn validate(&self) -> Result<(), String> {
        check_paging(self.page, self.page_size)
    }
}

impl Validate for CreateTaskRequest {
    fn validate(&self) -> Result<(), String> {
        require_non_blank("title", &self.title)?;
        check_priority(self.priority.as_deref())
    }
}

impl Validate for UpdateTaskRequest {
    fn validate(&self) -> Result<(), String> {
        optional_non_blank("title", self.title.as_deref())?;
        check_priority(self.priority.as_deref())
    }
}

impl Validate for UpdateTaskStatusRequest {
    fn validate(&self) -> Result<(), String> {
        require_non_blank("status", &self.status)
    }
}

async fn list_tasks(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidQuery(query): ValidQuery<TaskListQuery>,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.tasks.list(&ctx, &query).await?)
}

async fn get_task(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidId(id): ValidId,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.tasks.get(&ctx, &id).await?)
}

async fn create_task(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidJson(body): ValidJson<CreateTaskRequest>,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.tasks.create(&ctx, &body).await?)
}

async fn update_task(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidId(id): ValidId,
    ValidJson(body): ValidJson<UpdateTaskRequest>,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.tasks.update(&ctx, &id, &body).await?)
}

async fn update_task_status(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidId(id): ValidId,
    ValidJson(body): ValidJson<UpdateTaskStatusRequest>,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.tasks.update_status(&ctx, &id, &body).await?)
}

async fn delete_task(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidId(id): ValidId,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.tasks.delete(&ctx, &id).await?)
}
