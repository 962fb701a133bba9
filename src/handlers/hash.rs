use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::app::state::AppState;
use crate::handlers::error::ApiError;
use crate::models::payment::{PayuHashRequest, PayuHashResponse};
use crate::services::payu::PayuHashFields;

pub async fn generate_hash(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PayuHashResponse>, ApiError> {
    let Json(payload) = payload.map_err(|e| {
        error!("Rejected hash body: {}", e);
        ApiError::from(e)
    })?;
    let request: PayuHashRequest = match serde_json::from_value(payload) {
        Ok(req) => req,
        Err(e) => {
            error!("Invalid hash request: {}", e);
            return Err(ApiError::bad_request(format!("Invalid request: {}", e)));
        }
    };

    let fields = hash_fields(request)?;
    if fields.key != state.payu.merchant_key() {
        warn!("Hash requested for foreign merchant key on txn {}", fields.txnid);
    }

    info!("Generated PayU hash for txn {}", fields.txnid);
    Ok(Json(PayuHashResponse {
        hash: state.payu.hash(&fields),
    }))
}

fn hash_fields(request: PayuHashRequest) -> Result<PayuHashFields, ApiError> {
    let amount = match request.amount {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    let key = present(request.key);
    let txnid = present(request.txnid);
    let amount = present(amount);
    let productinfo = present(request.productinfo);
    let firstname = present(request.firstname);
    let email = present(request.email);

    let missing: Vec<&str> = [
        ("key", key.is_none()),
        ("txnid", txnid.is_none()),
        ("amount", amount.is_none()),
        ("productinfo", productinfo.is_none()),
        ("firstname", firstname.is_none()),
        ("email", email.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, absent)| absent.then_some(name))
    .collect();

    match (key, txnid, amount, productinfo, firstname, email) {
        (Some(key), Some(txnid), Some(amount), Some(productinfo), Some(firstname), Some(email)) => {
            Ok(PayuHashFields {
                key,
                txnid,
                amount,
                productinfo,
                firstname,
                email,
                udf: [
                    request.udf1.unwrap_or_default(),
                    request.udf2.unwrap_or_default(),
                    request.udf3.unwrap_or_default(),
                    request.udf4.unwrap_or_default(),
                    request.udf5.unwrap_or_default(),
                    request.udf6.unwrap_or_default(),
                    request.udf7.unwrap_or_default(),
                    request.udf8.unwrap_or_default(),
                    request.udf9.unwrap_or_default(),
                    request.udf10.unwrap_or_default(),
                ],
            })
        }
        _ => {
            warn!("Hash request missing fields: {}", missing.join(", "));
            Err(ApiError::bad_request(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )))
        }
    }
}
