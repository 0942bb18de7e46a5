//! `/api/v1/organizations`, `/api/v1/users` → account-service.

use axum::{
    extract::State,
    routing::{get, patch},
    Router,
};
use serde::Deserialize;

use crate::context::RequestContext;
use crate::envelope::BaseResponse;
use crate::http::error::ApiError;
use crate::http::extract::{check_paging, optional_non_blank, require_non_blank, Validate, ValidId, ValidJson, ValidQuery};
use crate::http::server::AppState;
use crate::upstream::account::{
    CreateDepartmentRequest, CreateOrganizationRequest, UpdateOrganizationRequest, UpdateUserProfileRequest,
    UserListQuery,
};
use crate::upstream::ListQuery;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/organizations", get(list_organizations).post(create_organization))
        .route(
            "/api/v1/organizations/{id}",
            get(get_organization).put(update_organization).delete(delete_organization),
        )
        .route(
            "/api/v1/organizations/{id}/departments",
            get(list_departments).post(create_department),
        )
        .route("/api/v1/users", get(list_users))
        .route("/api/v1/users/{id}", get(get_user))
        .route("/api/v1/users/{id}/profile", patch(update_user_profile))
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteOrganizationQuery {
    #[serde(default)]
    pub force: Option<bool>,
}

// `force` is a bool: `Query` already rejects anything but true/false.
impl Validate for DeleteOrganizationQuery {}

impl Validate for UserListQuery {
    fn validate(&self) -> Result<(), String> {
        check_paging(self.page, self.page_size)
    }
}

impl Validate for CreateOrganizationRequest {
    fn validate(&self) -> Result<(), String> {
        require_non_blank("name", &self.name)?;
        optional_non_blank("domain", self.domain.as_deref())
    }
}

impl Validate for UpdateOrganizationRequest {
    fn validate(&self) -> Result<(), String> {
        if self.name.is_none() && self.description.is_none() && self.domain.is_none() {
            return Err("at least one field must be set".to_string());
        }
        optional_non_blank("name", self.name.as_deref())?;
        optional_non_blank("domain", self.domain.as_deref())
    }
}

impl Validate for CreateDepartmentRequest {
    fn validate(&self) -> Result<(), String> {
        require_non_blank("name", &self.name)
    }
}

impl Validate for UpdateUserProfileRequest {
    fn validate(&self) -> Result<(), String> {
        optional_non_blank("first_name", self.first_name.as_deref())?;
        optional_non_blank("last_name", self.last_name.as_deref())
    }
}

async fn list_organizations(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidQuery(query): ValidQuery<ListQuery>,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.organizations.list(&ctx, &query).await?)
}

async fn get_organization(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidId(id): ValidId,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.organizations.get(&ctx, &id).await?)
}

async fn create_organization(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidJson(body): ValidJson<CreateOrganizationRequest>,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.organizations.create(&ctx, &body).await?)
}

async fn update_organization(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidId(id): ValidId,
    ValidJson(body): ValidJson<UpdateOrganizationRequest>,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.organizations.update(&ctx, &id, &body).await?)
}

async fn delete_organization(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidId(id): ValidId,
    ValidQuery(query): ValidQuery<DeleteOrganizationQuery>,
) -> Result<BaseResponse, ApiError> {
    let force = query.force.unwrap_or(false);
    Ok(state.upstreams.organizations.delete(&ctx, &id, force).await?)
}

async fn list_departments(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidId(id): ValidId,
    ValidQuery(query): ValidQuery<ListQuery>,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.organizations.list_departments(&ctx, &id, &query).await?)
}

async fn create_department(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidId(id): ValidId,
    ValidJson(body): ValidJson<CreateDepartmentRequest>,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.organizations.create_department(&ctx, &id, &body).await?)
}

async fn list_users(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidQuery(query): ValidQuery<UserListQuery>,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.users.list(&ctx, &query).await?)
}

async fn get_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidId(id): ValidId,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.users.get(&ctx, &id).await?)
}

async fn update_user_profile(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidId(id): ValidId,
    ValidJson(body): ValidJson<UpdateUserProfileRequest>,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.users.update_profile(&ctx, &id, &body).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::FromRequestParts;
    use axum::http::Request;

    async fn delete_query(uri: &str) -> Result<DeleteOrganizationQuery, ApiError> {
        let (mut parts, _) = Request::get(uri).body(()).unwrap().into_parts();
        ValidQuery::<DeleteOrganizationQuery>::from_request_parts(&mut parts, &())
            .await
            .map(|ValidQuery(query)| query)
    }

    #[tokio::test]
    async fn delete_force_flag_is_checked_by_deserialization() {
        assert_eq!(delete_query("/o/1").await.unwrap().force, None);
        assert_eq!(delete_query("/o/1?force=true").await.unwrap().force, Some(true));
        assert!(matches!(delete_query("/o/1?force=maybe").await, Err(ApiError::Validation(_))));
        assert!(matches!(delete_query("/o/1?cascade=true").await, Err(ApiError::Validation(_))));
    }

    #[test]
    fn empty_organization_update_is_rejected() {
        assert!(UpdateOrganizationRequest::default().validate().is_err());
    }

    #[test]
    fn blank_department_name_is_rejected() {
        let body = CreateDepartmentRequest {
            name: "  ".to_string(),
            description: None,
        };
        assert!(body.validate().is_err());
    }
}
