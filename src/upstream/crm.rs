//! crm-service: customers and leads.

use serde::{Deserialize, Serialize};

use crate::client::BaseApiClient;
use crate::context::RequestContext;
use crate::upstream::{envelope, AdapterResult, ListQuery, QueryBuilder};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCustomerRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCustomerRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LeadListQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
}

/// Options of a lead conversion, sent as query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConvertLeadQuery {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub create_deal: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct CustomerAdapter {
    client: BaseApiClient,
}

impl CustomerAdapter {
    pub fn new(client: BaseApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &BaseApiClient {
        &self.client
    }

    pub async fn list(&self, ctx: &RequestContext, query: &ListQuery) -> AdapterResult {
        let query = query.to_query().build();
        envelope(self.client.get_with_query(ctx, "/api/v1/customers", &query).await?)
    }

    pub async fn get(&self, ctx: &RequestContext, id: &str) -> AdapterResult {
        envelope(self.client.get(ctx, &format!("/api/v1/customers/{id}")).await?)
    }

    pub async fn create(&self, ctx: &RequestContext, body: &CreateCustomerRequest) -> AdapterResult {
        envelope(self.client.post(ctx, "/api/v1/customers", body).await?)
    }

    pub async fn update(&self, ctx: &RequestContext, id: &str, body: &UpdateCustomerRequest) -> AdapterResult {
        envelope(self.client.put(ctx, &format!("/api/v1/customers/{id}"), body).await?)
    }

    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> AdapterResult {
        envelope(self.client.delete(ctx, &format!("/api/v1/customers/{id}")).await?)
    }
}

#[derive(Debug, Clone)]
pub struct LeadAdapter {
    client: BaseApiClient,
}

impl LeadAdapter {
    pub fn new(client: BaseApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &BaseApiClient {
        &self.client
    }

    pub async fn list(&self, ctx: &RequestContext, query: &LeadListQuery) -> AdapterResult {
        let query = QueryBuilder::new()
            .opt("page", query.page)
            .opt("page_size", query.page_size)
            .opt("status", query.status.as_deref())
            .opt("owner_id", query.owner_id.as_deref())
            .build();
        envelope(self.client.get_with_query(ctx, "/api/v1/leads", &query).await?)
    }

    /// Converting is a bodiless POST; its options travel in the query string.
    pub async fn convert(&self, ctx: &RequestContext, id: &str, options: &ConvertLeadQuery) -> AdapterResult {
        let query = QueryBuilder::new()
            .opt("customer_id", options.customer_id.as_deref())
            .opt("create_deal", options.create_deal)
            .build();
        let path = format!("/api/v1/leads/{id}/convert");
        envelope(
            self.client
                .post_with_query(ctx, &path, &query, None::<&()>)
                .await?,
        )
    }
}
