use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with every Mercury endpoint.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handler::health_handler))
        .route("/currentStipend", get(handler::current_stipend_handler))
        .route("/balance/:id", get(handler::balance_handler))
        .route("/transactions", get(handler::admin_transactions_handler))
        .route("/transactions/:id", get(handler::transactions_handler))
        .route("/transact", post(handler::transact_handler))
        .route("/mint", post(handler::mint_handler))
        .route("/burn", post(handler::burn_handler))
        .route("/stipend/:id", post(handler::stipend_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
