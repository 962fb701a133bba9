pub mod config;
pub mod state;

use axum::{
    http::StatusCode,
    routing::{any, get, post},
    Router,
};
use std::sync::Arc;

use crate::handlers::{hash, payments, proxy};
use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/payment/create-order", post(payments::create_order))
        .route("/api/payment/verify", post(payments::verify_payment))
        .route("/api/payment/hash", post(hash::generate_hash))
        .route("/api/v1/{*path}", any(proxy::forward))
        .with_state(state)
}

async fn health_handler() -> StatusCode {
    StatusCode::OK
}
