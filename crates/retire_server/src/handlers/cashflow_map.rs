//! `POST /v2/rpc/cashflow-map` (C14), wrapping the deterministic per-year
//! projection in `retire_core::optimization::cashflow_map`.

use axum::Json;
use jiff::Timestamp;
use retire_core::config::profile_to_retirement_params;
use retire_core::model::Profile;
use retire_core::optimization::{CashflowMapEntry, build_cashflow_map};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::state::AppState;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashflowMapRequest {
    pub params: Profile,
}

pub async fn cashflow_map(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
    Json(req): Json<CashflowMapRequest>,
) -> ApiResult<Json<Vec<CashflowMapEntry>>> {
    let current_year = Timestamp::now().to_zoned(jiff::tz::TimeZone::UTC).date().year() as i32;
    let params = profile_to_retirement_params(&req.params, &state.cma, current_year);
    Ok(Json(build_cashflow_map(&params)))
}
