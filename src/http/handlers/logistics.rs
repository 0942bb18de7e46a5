//! `/api/v1/shipments` → logistics-service.

use axum::{
    extract::State,
    routing::{get, patch},
    Router,
};

use crate::context::RequestContext;
use crate::envelope::BaseResponse;
use crate::http::error::ApiError;
use crate::http::extract::{check_paging, require_non_blank, Validate, ValidId, ValidJson, ValidQuery};
use crate::http::server::AppState;
use crate::upstream::logistics::{CreateShipmentRequest, ShipmentListQuery, UpdateShipmentStatusRequest};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/shipments", get(list_shipments).post(create_shipment))
        .route("/api/v1/shipments/{id}", get(get_shipment))
        .route("/api/v1/shipments/{id}/status", patch(update_shipment_status))
}

impl Validate for ShipmentListQuery {
    fn validate(&self) -> Result<(), String> {
        check_paging(self.page, self.page_size)
    }
}

impl Validate for CreateShipmentRequest {
    fn validate(&self) -> Result<(), String> {
        require_non_blank("origin", &self.origin)?;
        require_non_blank("destination", &self.destination)?;
        match self.weight_kg {
            Some(weight) if !(weight.is_finite() && weight > 0.0) => Err("weight_kg must be positive".to_string()),
            _ => Ok(()),
        }
    }
}

impl Validate for UpdateShipmentStatusRequest {
    fn validate(&self) -> Result<(), String> {
        require_non_blank("status", &self.status)
    }
}

async fn list_shipments(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidQuery(query): ValidQuery<ShipmentListQuery>,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.shipments.list(&ctx, &query).await?)
}

async fn get_shipment(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidId(id): ValidId,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.shipments.get(&ctx, &id).await?)
}

async fn create_shipment(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidJson(body): ValidJson<CreateShipmentRequest>,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.shipments.create(&ctx, &body).await?)
}

async fn update_shipment_status(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidId(id): ValidId,
    ValidJson(body): ValidJson<UpdateShipmentStatusRequest>,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.shipments.update_status(&ctx, &id, &body).await?)
}
