//! Edge handlers.
//!
//! Each handler parses and validates its input, calls exactly one adapter
//! method, and emits the envelope it gets back under its own `code`.

pub mod account;
pub mod crm;
pub mod health;
pub mod logistics;
pub mod purchase;
pub mod task;

use axum::{routing::get, Router};

use crate::envelope::BaseResponse;
use crate::http::extract::{check_paging, Validate};
use crate::http::server::AppState;
use crate::upstream::ListQuery;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .merge(account::routes())
        .merge(crm::routes())
        .merge(logistics::routes())
        .merge(purchase::routes())
        .merge(task::routes())
}

impl Validate for ListQuery {
    fn validate(&self) -> Result<(), String> {
        check_paging(self.page, self.page_size)
    }
}

/// Unknown routes.
pub async fn not_found() -> BaseResponse {
    BaseResponse::not_found()
}
