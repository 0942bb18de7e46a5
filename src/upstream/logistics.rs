//! logistics-service: shipments.

use serde::{Deserialize, Serialize};

use crate::client::BaseApiClient;
use crate::context::RequestContext;
use crate::upstream::{envelope, AdapterResult, QueryBuilder};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CreateShipmentRequest {
    pub origin: String,
    pub destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateShipmentStatusRequest {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ShipmentListQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub carrier: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ShipmentAdapter {
    client: BaseApiClient,
}

impl ShipmentAdapter {
    pub fn new(client: BaseApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &BaseApiClient {
        &self.client
    }

    pub async fn list(&self, ctx: &RequestContext, query: &ShipmentListQuery) -> AdapterResult {
        let query = QueryBuilder::new()
            .opt("page", query.page)
            .opt("page_size", query.page_size)
            .opt("status", query.status.as_deref())
            .opt("carrier", query.carrier.as_deref())
            .build();
        envelope(self.client.get_with_query(ctx, "/api/v1/shipments", &query).await?)
    }

    pub async fn get(&self, ctx: &RequestContext, id: &str) -> AdapterResult {
        envelope(self.client.get(ctx, &format!("/api/v1/shipments/{id}")).await?)
    }

    pub async fn create(&self, ctx: &RequestContext, body: &CreateShipmentRequest) -> AdapterResult {
        envelope(self.client.post(ctx, "/api/v1/shipments", body).await?)
    }

    pub async fn update_status(&self, ctx: &RequestContext, id: &str, body: &UpdateShipmentStatusRequest) -> AdapterResult {
        envelope(self.client.patch(ctx, &format!("/api/v1/shipments/{id}/status"), body).await?)
    }
}
