//! purchase-service: purchase orders.

use serde::{Deserialize, Serialize};

use crate::client::BaseApiClient;
use crate::context::RequestContext;
use crate::upstream::{envelope, AdapterResult, QueryBuilder};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PurchaseOrderLine {
    pub sku: String,
    pub quantity: u32,
    pub unit_price: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePurchaseOrderRequest {
    pub supplier_id: String,
    pub lines: Vec<PurchaseOrderLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePurchaseOrderRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<PurchaseOrderLine>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApprovePurchaseOrderRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PurchaseOrderListQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub supplier_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PurchaseOrderAdapter {
    client: BaseApiClient,
}

impl PurchaseOrderAdapter {
    pub fn new(client: BaseApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &BaseApiClient {
        &self.client
    }

    pub async fn list(&self, ctx: &RequestContext, query: &PurchaseOrderListQuery) -> AdapterResult {
        let query = QueryBuilder::new()
            .opt("page", query.page)
            .opt("page_size", query.page_size)
            .opt("status", query.status.as_deref())
            .opt("supplier_id", query.supplier_id.as_deref())
            .build();
        envelope(self.client.get_with_query(ctx, "/api/v1/purchase-orders", &query).await?)
    }

    pub async fn get(&self, ctx: &RequestContext, id: &str) -> AdapterResult {
        envelope(self.client.get(ctx, &format!("/api/v1/purchase-orders/{id}")).await?)
    }

    pub async fn create(&self, ctx: &RequestContext, body: &CreatePurchaseOrderRequest) -> AdapterResult {
        envelope(self.client.post(ctx, "/api/v1/purchase-orders", body).await?)
    }

    pub async fn update(&self, ctx: &RequestContext, id: &str, body: &UpdatePurchaseOrderRequest) -> AdapterResult {
        envelope(self.client.put(ctx, &format!("/api/v1/purchase-orders/{id}"), body).await?)
    }

    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> AdapterResult {
        envelope(self.client.delete(ctx, &format!("/api/v1/purchase-orders/{id}")).await?)
    }

    pub async fn approve(&self, ctx: &RequestContext, id: &str, body: &ApprovePurchaseOrderRequest) -> AdapterResult {
        envelope(self.client.post(ctx, &format!("/api/v1/purchase-orders/{id}/approve"), body).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_order_rejects_unknown_fields() {
        let parsed = serde_json::from_str::<CreatePurchaseOrderRequest>(
            r#"{"supplier_id":"s1","lines":[],"discount":5}"#,
        );
        assert!(parsed.is_err());
    }
}
