//! account-service: organizations, departments and users.

use serde::{Deserialize, Serialize};

use crate::client::BaseApiClient;
use crate::context::RequestContext;
use crate::upstream::{envelope, AdapterResult, ListQuery, QueryBuilder};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CreateOrganizationRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateOrganizationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CreateDepartmentRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserProfileRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Users filtered by organization and department on top of paging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UserListQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub department_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OrganizationAdapter {
    client: BaseApiClient,
}

impl OrganizationAdapter {
    pub fn new(client: BaseApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &BaseApiClient {
        &self.client
    }

    pub async fn list(&self, ctx: &RequestContext, query: &ListQuery) -> AdapterResult {
        let query = query.to_query().build();
        envelope(self.client.get_with_query(ctx, "/api/v1/organizations", &query).await?)
    }

    pub async fn get(&self, ctx: &RequestContext, id: &str) -> AdapterResult {
        envelope(self.client.get(ctx, &format!("/api/v1/organizations/{id}")).await?)
    }

    pub async fn create(&self, ctx: &RequestContext, body: &CreateOrganizationRequest) -> AdapterResult {
        envelope(self.client.post(ctx, "/api/v1/organizations", body).await?)
    }

    pub async fn update(&self, ctx: &RequestContext, id: &str, body: &UpdateOrganizationRequest) -> AdapterResult {
        envelope(self.client.put(ctx, &format!("/api/v1/organizations/{id}"), body).await?)
    }

    /// `force` also removes departments still attached to the organization.
    pub async fn delete(&self, ctx: &RequestContext, id: &str, force: bool) -> AdapterResult {
        let path = format!("/api/v1/organizations/{id}");
        let response = if force {
            let query = QueryBuilder::new().param("force", true).build();
            self.client.delete_with_query(ctx, &path, &query).await?
        } else {
            self.client.delete(ctx, &path).await?
        };
        envelope(response)
    }

    pub async fn list_departments(&self, ctx: &RequestContext, organization_id: &str, query: &ListQuery) -> AdapterResult {
        let query = query.to_query().build();
        let path = format!("/api/v1/organizations/{organization_id}/departments");
        envelope(self.client.get_with_query(ctx, &path, &query).await?)
    }

    pub async fn create_department(
        &self,
        ctx: &RequestContext,
        organization_id: &str,
        body: &CreateDepartmentRequest,
    ) -> AdapterResult {
        let path = format!("/api/v1/organizations/{organization_id}/departments");
        envelope(self.client.post(ctx, &path, body).await?)
    }
}

#[derive(Debug, Clone)]
pub struct UserAdapter {
    client: BaseApiClient,
}

impl UserAdapter {
    pub fn new(client: BaseApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &BaseApiClient {
        &self.client
    }

    pub async fn list(&self, ctx: &RequestContext, query: &UserListQuery) -> AdapterResult {
        let query = QueryBuilder::new()
            .opt("page", query.page)
            .opt("page_size", query.page_size)
            .opt("search", query.search.as_deref())
            .opt("organization_id", query.organization_id.as_deref())
            .opt("department_id", query.department_id.as_deref())
            .build();
        envelope(self.client.get_with_query(ctx, "/api/v1/users", &query).await?)
    }

    pub async fn get(&self, ctx: &RequestContext, id: &str) -> AdapterResult {
        envelope(self.client.get(ctx, &format!("/api/v1/users/{id}")).await?)
    }

    pub async fn update_profile(&self, ctx: &RequestContext, id: &str, body: &UpdateUserProfileRequest) -> AdapterResult {
        envelope(self.client.patch(ctx, &format!("/api/v1/users/{id}/profile"), body).await?)
    }
}
