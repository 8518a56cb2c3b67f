//! Dashboard route definitions

use super::handlers;
use super::AppState;
use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the dashboard router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/items", get(handlers::list_items))
        .route("/api/datacenters", get(handlers::list_datacenters))
        .route("/api/history/:world/:item_id", get(handlers::world_history))
        .route(
            "/api/lookup/:data_center/:item_id",
            get(handlers::datacenter_lookup),
        )
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
