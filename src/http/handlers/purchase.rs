//! `/api/v1/purchase-orders` → purchase-service.

use axum::{
    extract::State,
    routing::{get, post},
    Router,
};

use crate::context::RequestContext;
use crate::envelope::BaseResponse;
use crate::http::error::ApiError;
use crate::http::extract::{check_paging, require_non_blank, Validate, ValidId, ValidJson, ValidQuery};
use crate::http::server::AppState;
use crate::upstream::purchase::{
    ApprovePurchaseOrderRequest, CreatePurchaseOrderRequest, PurchaseOrderLine, PurchaseOrderListQuery,
    UpdatePurchaseOrderRequest,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/purchase-orders", get(list_orders).post(create_order))
        .route(
            "/api/v1/purchase-orders/{id}",
            get(get_order).put(update_order).delete(delete_order),
        )
        .route("/api/v1/purchase-orders/{id}/approve", post(approve_order))
}

fn check_lines(lines: &[PurchaseOrderLine]) -> Result<(), String> {
    if lines.is_empty() {
        return Err("lines must not be empty".to_string());
    }
    for line in lines {
        require_non_blank("sku", &line.sku)?;
        if line.quantity == 0 {
            return Err("quantity must be at least 1".to_string());
        }
        if !(line.unit_price.is_finite() && line.unit_price >= 0.0) {
            return Err("unit_price must not be negative".to_string());
        }
    }
    Ok(())
}

impl Validate for PurchaseOrderListQuery {
    fn validate(&self) -> Result<(), String> {
        check_paging(self.page, self.page_size)
    }
}

impl Validate for CreatePurchaseOrderRequest {
    fn validate(&self) -> Result<(), String> {
        require_non_blank("supplier_id", &self.supplier_id)?;
        check_lines(&self.lines)
    }
}

impl Validate for UpdatePurchaseOrderRequest {
    fn validate(&self) -> Result<(), String> {
        match &self.lines {
            Some(lines) => check_lines(lines),
            None => Ok(()),
        }
    }
}

impl Validate for ApprovePurchaseOrderRequest {}

async fn list_orders(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidQuery(query): ValidQuery<PurchaseOrderListQuery>,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.purchase_orders.list(&ctx, &query).await?)
}

async fn get_order(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidId(id): ValidId,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.purchase_orders.get(&ctx, &id).await?)
}

async fn create_order(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidJson(body): ValidJson<CreatePurchaseOrderRequest>,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.purchase_orders.create(&ctx, &body).await?)
}

async fn update_order(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidId(id): ValidId,
    ValidJson(body): ValidJson<UpdatePurchaseOrderRequest>,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.purchase_orders.update(&ctx, &id, &body).await?)
}

async fn delete_order(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidId(id): ValidId,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.purchase_orders.delete(&ctx, &id).await?)
}

async fn approve_order(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidId(id): ValidId,
    ValidJson(body): ValidJson<ApprovePurchaseOrderRequest>,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.purchase_orders.approve(&ctx, &id, &body).await?)
}
