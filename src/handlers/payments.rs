use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::ORIGIN, HeaderMap},
    response::Json,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use crate::app::state::AppState;
use crate::handlers::error::ApiError;
use crate::models::payment::{
    PaymentOrderRequest, PaymentOrderResult, PaymentVerificationRequest, PaymentVerificationResult,
};

pub async fn create_order(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PaymentOrderResult>, ApiError> {
    let Json(payload) = payload.map_err(|e| {
        error!("Rejected order body: {}", e);
        ApiError::from(e)
    })?;
    let request: PaymentOrderRequest = match serde_json::from_value(payload) {
        Ok(req) => req,
        Err(e) => {
            error!("Invalid order request: {}", e);
            return Err(ApiError::bad_request(format!("Invalid request: {}", e)));
        }
    };

    let origin = headers.get(ORIGIN).and_then(|value| value.to_str().ok());
    info!(
        "Received order request: plan={:?} gateway={:?}",
        request.plan, request.payment_gateway
    );

    let result = state.orders.create_order(request, origin).await?;
    Ok(Json(result))
}

pub async fn verify_payment(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PaymentVerificationResult>, ApiError> {
    let Json(payload) = payload.map_err(|e| {
        error!("Rejected verification body: {}", e);
        ApiError::from(e)
    })?;
    let request: PaymentVerificationRequest = match serde_json::from_value(payload) {
        Ok(req) => req,
        Err(e) => {
            error!("Invalid verification request: {}", e);
            return Err(ApiError::bad_request(format!("Invalid request: {}", e)));
        }
    };

    info!(
        "Received verification request for order {:?}",
        request.order_id
    );

    let result = state.verifier.verify(&request)?;
    Ok(Json(result))
}
