use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::Sha256;
use tracing::{debug, error, info};

use crate::app::config::RazorpayConfig;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("{description}")]
    Rejected {
        status: u16,
        code: String,
        description: String,
    },
    #[error("unexpected gateway response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Body of Razorpay's `POST /v1/orders`. Amount is in minor units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateOrderRequest {
    pub amount: u64,
    pub currency: String,
    pub receipt: String,
    pub notes: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RazorpayOrder {
    pub id: String,
    pub amount: u64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorBody {
    error: RazorpayErrorDetail,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[async_trait]
pub trait RazorpayApi: Send + Sync {
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<RazorpayOrder, GatewayError>;
}

pub struct RazorpayClient {
    client: Client,
    config: RazorpayConfig,
}

impl RazorpayClient {
    pub fn new(client: Client, config: RazorpayConfig) -> Self {
        Self { client, config }
    }

    fn orders_url(&self) -> String {
        format!("{}/orders", self.config.api_base_url.as_str().trim_end_matches('/'))
    }
}

#[async_trait]
impl RazorpayApi for RazorpayClient {
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<RazorpayOrder, GatewayError> {
        let response = self
            .client
            .post(self.orders_url())
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.expose_secret()))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("Razorpay create_order responded with {}", status);

        if status.is_success() {
            let order: RazorpayOrder = serde_json::from_str(&body)?;
            info!(
                "Razorpay order {} created for {} {}",
                order.id, order.amount, order.currency
            );
            return Ok(order);
        }

        let (code, description) = match serde_json::from_str::<RazorpayErrorBody>(&body) {
            Ok(parsed) => (
                parsed.error.code.unwrap_or_else(|| "UNKNOWN".to_string()),
                parsed
                    .error
                    .description
                    .unwrap_or_else(|| format!("HTTP {}", status)),
            ),
            Err(_) => ("UNKNOWN".to_string(), format!("HTTP {}", status)),
        };

        error!("Razorpay rejected order creation: {} ({})", description, code);
        Err(GatewayError::Rejected {
            status: status.as_u16(),
            code,
            description,
        })
    }
}

/// Hex HMAC-SHA256 of `order_id|payment_id` keyed with the Razorpay key secret.
pub fn payment_signature(key_secret: &str, order_id: &str, payment_id: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(key_secret.as_bytes()).ok()?;
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

pub fn verify_payment_signature(
    key_secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> bool {
    match payment_signature(key_secret, order_id, payment_id) {
        Some(expected) => expected == signature,
        None => false,
    }
}
