//! Route configuration.

use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

/// Create the application router.
///
/// The `{version}` segment is matched loosely here; handlers resolve it from the
/// full request path and reject anything but v3 and v4.
pub fn create_router(state: AppState) -> Router {
    let collateral_routes = Router::new()
        .route("/sgx/certification/{version}/crl", get(handlers::get_crl))
        .route(
            "/sgx/certification/{version}/qe/identity",
            get(handlers::get_qe_identity),
        )
        .route(
            "/sgx/certification/{version}/qve/identity",
            get(handlers::get_qve_identity),
        )
        .route(
            "/sgx/certification/{version}/tdqe/identity",
            get(handlers::get_tdqe_identity),
        );

    Router::new()
        .merge(collateral_routes)
        // Health check (unauthenticated, for probes)
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
