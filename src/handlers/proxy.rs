use axum::{
    body::Bytes,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use crate::app::state::AppState;
use crate::handlers::error::ApiError;

const PREFIX: &str = "/api/v1/";

/// `ANY /api/v1/{*path}`. The path is taken from the raw URI so percent-encoded
/// segments reach the upstream undecoded.
pub async fn forward(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let path = uri.path().strip_prefix(PREFIX).unwrap_or_default();

    let payload = if body.is_empty() {
        None
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(value) => Some(value),
            Err(e) => {
                error!("Invalid JSON body for {}: {}", uri.path(), e);
                return Err(ApiError::bad_request("Invalid JSON body"));
            }
        }
    };

    let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());

    let response = state
        .upstream
        .forward(method.as_str(), path, uri.query(), authorization, payload)
        .await?;

    info!("{} {} -> {}", method, uri.path(), response.status);
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    Ok(match response.body {
        Some(body) => (status, Json(body)).into_response(),
        None => status.into_response(),
    })
}
