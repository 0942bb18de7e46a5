//! `/api/v1/customers`, `/api/v1/leads` → crm-service.

use axum::{
    extract::State,
    routing::{get, post},
    Router,
};

use crate::context::RequestContext;
use crate::envelope::BaseResponse;
use crate::http::error::ApiError;
use crate::http::extract::{check_paging, optional_non_blank, require_non_blank, Validate, ValidId, ValidJson, ValidQuery};
use crate::http::server::AppState;
use crate::upstream::crm::{ConvertLeadQuery, CreateCustomerRequest, LeadListQuery, UpdateCustomerRequest};
use crate::upstream::ListQuery;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/customers", get(list_customers).post(create_customer))
        .route(
            "/api/v1/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/api/v1/leads", get(list_leads))
        .route("/api/v1/leads/{id}/convert", post(convert_lead))
}

fn check_email(email: Option<&str>) -> Result<(), String> {
    match email {
        Some(email) if !email.contains('@') => Err("email must be an address".to_string()),
        _ => Ok(()),
    }
}

impl Validate for CreateCustomerRequest {
    fn validate(&self) -> Result<(), String> {
        require_non_blank("name", &self.name)?;
        check_email(self.email.as_deref())
    }
}

impl Validate for UpdateCustomerRequest {
    fn validate(&self) -> Result<(), String> {
        optional_non_blank("name", self.name.as_deref())?;
        check_email(self.email.as_deref())
    }
}

impl Validate for LeadListQuery {
    fn validate(&self) -> Result<(), String> {
        check_paging(self.page, self.page_size)
    }
}

impl Validate for ConvertLeadQuery {
    fn validate(&self) -> Result<(), String> {
        optional_non_blank("customer_id", self.customer_id.as_deref())
    }
}

async fn list_customers(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidQuery(query): ValidQuery<ListQuery>,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.customers.list(&ctx, &query).await?)
}

async fn get_customer(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidId(id): ValidId,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.customers.get(&ctx, &id).await?)
}

async fn create_customer(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidJson(body): ValidJson<CreateCustomerRequest>,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.customers.create(&ctx, &body).await?)
}

async fn update_customer(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidId(id): ValidId,
    ValidJson(body): ValidJson<UpdateCustomerRequest>,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.customers.update(&ctx, &id, &body).await?)
}

async fn delete_customer(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidId(id): ValidId,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.customers.delete(&ctx, &id).await?)
}

async fn list_leads(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidQuery(query): ValidQuery<LeadListQuery>,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.leads.list(&ctx, &query).await?)
}

async fn convert_lead(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidId(id): ValidId,
    ValidQuery(options): ValidQuery<ConvertLeadQuery>,
) -> Result<BaseResponse, ApiError> {
    Ok(state.upstreams.leads.convert(&ctx, &id, &options).await?)
}
