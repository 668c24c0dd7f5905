use std::sync::Arc;

use axum::Router;
use axum::routing::post;

use crate::handlers;
use crate::state::AppState;

pub fn rpc_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/simulate-retirement-monte-carlo",
            post(handlers::simulate_retirement_monte_carlo),
        )
        .route(
            "/calculate-retirement-bands",
            post(handlers::calculate_retirement_bands),
        )
        .route(
            "/calculate-retirement-bands-optimization",
            post(handlers::calculate_retirement_bands_optimization),
        )
        .route(
            "/calculate-cumulative-ss-optimization",
            post(handlers::calculate_cumulative_ss_optimization),
        )
        .route(
            "/v2/rpc/cashflow-map",
            post(handlers::cashflow_map_handler),
        )
}
