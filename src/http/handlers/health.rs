//! Gateway health: per-upstream breaker state, no upstream I/O.

use axum::extract::State;
use serde::Serialize;

use crate::envelope::BaseResponse;
use crate::http::server::AppState;
use crate::resilience::{BreakerSnapshot, CircuitState};

#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// `ok` when every breaker is closed, `degraded` otherwise.
    pub status: &'static str,
    pub upstreams: Vec<BreakerSnapshot>,
}

pub async fn health(State(state): State<AppState>) -> BaseResponse<HealthReport> {
    let upstreams = state.upstreams.breaker_snapshots();
    let degraded = upstreams.iter().any(|s| s.state != CircuitState::Closed);
    BaseResponse::success(HealthReport {
        status: if degraded { "degraded" } else { "ok" },
        upstreams,
    })
}
