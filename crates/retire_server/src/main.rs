mod error;
mod handlers;
mod routes;
mod state;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use retire_core::config::EngineConfig;
use state::AppState;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();

    let engine_config = EngineConfig::from_env().expect("failed to load engine configuration");
    tracing::info!(
        cma_version = %engine_config.cma_version,
        default_iterations = engine_config.default_iterations,
        "engine configuration loaded"
    );

    let state = Arc::new(AppState::new(engine_config));

    let app = Router::new()
        .route("/", axum::routing::get(|| async { "retirement engine RPC" }))
        .merge(routes::rpc_routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = std::env::var("RETIRE_SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3002".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|err| panic!("failed to bind {addr}: {err}"));

    tracing::info!(address = %listener.local_addr().unwrap(), "retire_server listening");

    axum::serve(listener, app)
        .await
        .expect("server terminated unexpectedly");
}
