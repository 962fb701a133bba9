use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::utils::money::MajorUnits;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gateway {
    #[serde(rename = "razorpay")]
    Razorpay,
    #[serde(rename = "payu")]
    PayU,
}

impl Gateway {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gateway::Razorpay => "razorpay",
            Gateway::PayU => "payu",
        }
    }

    /// Region routing used when the client does not pick a gateway.
    pub fn for_currency(currency: Currency) -> Self {
        match currency {
            Currency::Inr => Gateway::PayU,
            Currency::Usd => Gateway::Razorpay,
        }
    }
}

impl fmt::Display for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownGateway(pub String);

impl FromStr for Gateway {
    type Err = UnknownGateway;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "razorpay" => Ok(Gateway::Razorpay),
            "payu" => Ok(Gateway::PayU),
            other => Err(UnknownGateway(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    #[serde(rename = "INR")]
    Inr,
    #[serde(rename = "USD")]
    Usd,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Inr => "INR",
            Currency::Usd => "USD",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCurrency(pub String);

impl FromStr for Currency {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INR" => Ok(Currency::Inr),
            "USD" => Ok(Currency::Usd),
            other => Err(UnknownCurrency(other.to_string())),
        }
    }
}

// Body of POST /api/payment/create-order
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrderRequest {
    pub amount: Option<u64>,
    pub currency: Option<String>,
    pub payment_gateway: Option<String>,
    pub plan: Option<String>,
    pub user_id: Option<Value>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub notes: Map<String, Value>,
}

/// Amount as reported back to the checkout page.
///
/// Razorpay orders report a JSON number in major units; PayU orders report
/// the exact decimal string that went into the request hash.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportedAmount {
    Major(MajorUnits),
    Decimal(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrderResult {
    pub success: bool,
    pub order_id: String,
    pub currency: Currency,
    pub amount: ReportedAmount,
    pub gateway: Gateway,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_data: Option<PayuPaymentData>,
}

// Fields the client posts to PayU's hosted payment page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayuPaymentData {
    pub key: String,
    pub txnid: String,
    pub amount: String,
    pub productinfo: String,
    pub firstname: String,
    pub email: String,
    pub phone: String,
    pub surl: String,
    pub furl: String,
    pub hash: String,
    pub action: String,
}

// Body of POST /api/payment/verify
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerificationRequest {
    pub payment_id: Option<String>,
    pub order_id: Option<String>,
    pub signature: Option<String>,
    pub payment_gateway: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub additional_params: Map<String, Value>,
}

impl PaymentVerificationRequest {
    /// Looks up a PayU response field, accepting strings and numbers.
    pub fn additional_param(&self, name: &str) -> Option<String> {
        match self.additional_params.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerificationResult {
    pub success: bool,
    pub message: String,
    pub payment_id: String,
    pub order_id: String,
}

// Body of POST /api/payment/hash
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PayuHashRequest {
    pub key: Option<String>,
    pub txnid: Option<String>,
    pub amount: Option<Value>,
    pub productinfo: Option<String>,
    pub firstname: Option<String>,
    pub email: Option<String>,
    pub udf1: Option<String>,
    pub udf2: Option<String>,
    pub udf3: Option<String>,
    pub udf4: Option<String>,
    pub udf5: Option<String>,
    pub udf6: Option<String>,
    pub udf7: Option<String>,
    pub udf8: Option<String>,
    pub udf9: Option<String>,
    pub udf10: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayuHashResponse {
    pub hash: String,
}
