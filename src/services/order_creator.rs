use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};
use url::Url;
use uuid::Uuid;

use crate::models::payment::{
    Currency, Gateway, PaymentOrderRequest, PaymentOrderResult, ReportedAmount,
};
use crate::services::payu::{PayuCheckout, PayuOrderInput};
use crate::services::razorpay::{CreateOrderRequest, GatewayError, RazorpayApi};
use crate::utils::money::MajorUnits;

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Amount is required")]
    MissingAmount,
    #[error("Email is required")]
    MissingEmail,
    #[error("Unsupported currency")]
    UnsupportedCurrency,
    #[error("Invalid payment gateway")]
    InvalidGateway,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

pub struct OrderCreator {
    razorpay: Arc<dyn RazorpayApi>,
    payu: PayuCheckout,
    default_origin: Url,
}

impl OrderCreator {
    pub fn new(razorpay: Arc<dyn RazorpayApi>, payu: PayuCheckout, default_origin: Url) -> Self {
        Self {
            razorpay,
            payu,
            default_origin,
        }
    }

    /// Creates an order on the requested gateway. `origin` is the caller's
    /// `Origin` header, used for PayU's return URLs.
    pub async fn create_order(
        &self,
        request: PaymentOrderRequest,
        origin: Option<&str>,
    ) -> Result<PaymentOrderResult, OrderError> {
        let amount = match request.amount {
            Some(amount) if amount > 0 => amount,
            _ => {
                warn!("Rejected order without amount");
                return Err(OrderError::MissingAmount);
            }
        };

        let currency = match request.currency.as_deref() {
            None => Currency::default(),
            Some(raw) => raw.parse::<Currency>().map_err(|_| {
                warn!("Rejected order with unsupported currency {}", raw);
                OrderError::UnsupportedCurrency
            })?,
        };

        let gateway = match request.payment_gateway.as_deref() {
            None => {
                let routed = Gateway::for_currency(currency);
                info!("No gateway requested, routing {} order to {}", currency.as_str(), routed);
                routed
            }
            Some(raw) => raw.parse::<Gateway>().map_err(|_| {
                warn!("Rejected order with unknown gateway {}", raw);
                OrderError::InvalidGateway
            })?,
        };

        match gateway {
            Gateway::Razorpay => self.create_razorpay_order(amount, currency, request).await,
            Gateway::PayU => self.create_payu_order(amount, currency, request, origin),
        }
    }

    async fn create_razorpay_order(
        &self,
        amount: u64,
        currency: Currency,
        request: PaymentOrderRequest,
    ) -> Result<PaymentOrderResult, OrderError> {
        let mut notes = request.notes;
        if let Some(plan) = request.plan {
            notes.entry("plan").or_insert(Value::String(plan));
        }
        if let Some(user_id) = request.user_id {
            notes.entry("userId").or_insert(user_id);
        }

        let order_request = CreateOrderRequest {
            amount,
            currency: currency.as_str().to_string(),
            receipt: format!("receipt_{}", Uuid::new_v4().simple()),
            notes,
        };

        let order = self.razorpay.create_order(&order_request).await.map_err(|e| {
            error!("Razorpay order creation failed: {}", e);
            OrderError::Gateway(e)
        })?;

        info!("Created Razorpay order {} ({})", order.id, order_request.receipt);

        // Gateway call uses minor units, the checkout page gets major units.
        Ok(PaymentOrderResult {
            success: true,
            order_id: order.id,
            currency,
            amount: ReportedAmount::Major(MajorUnits::from_minor(amount)),
            gateway: Gateway::Razorpay,
            payment_data: None,
        })
    }

    fn create_payu_order(
        &self,
        amount: u64,
        currency: Currency,
        request: PaymentOrderRequest,
        origin: Option<&str>,
    ) -> Result<PaymentOrderResult, OrderError> {
        let email = match request.email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => email,
            _ => {
                warn!("Rejected PayU order without email");
                return Err(OrderError::MissingEmail);
            }
        };

        let firstname = request
            .first_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or(email));

        let productinfo = request
            .plan
            .as_deref()
            .filter(|plan| !plan.is_empty())
            .unwrap_or("subscription");

        let origin = self.resolve_origin(origin);
        let payment_data = self.payu.build_order(PayuOrderInput {
            amount: MajorUnits::from_minor(amount).to_string(),
            productinfo,
            firstname,
            email,
            phone: request.phone.as_deref().unwrap_or(""),
            origin: &origin,
        });

        info!("Created PayU order {} for plan {}", payment_data.txnid, productinfo);

        Ok(PaymentOrderResult {
            success: true,
            order_id: payment_data.txnid.clone(),
            currency,
            amount: ReportedAmount::Decimal(payment_data.amount.clone()),
            gateway: Gateway::PayU,
            payment_data: Some(payment_data),
        })
    }

    fn resolve_origin(&self, origin: Option<&str>) -> Url {
        origin
            .and_then(|raw| Url::parse(raw).ok())
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or_else(|| self.default_origin.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::PayuConfig;
    use crate::services::razorpay::RazorpayOrder;
    use async_trait::async_trait;
    use secrecy::SecretString;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRazorpay {
        requests: Mutex<Vec<CreateOrderRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl RazorpayApi for RecordingRazorpay {
        async fn create_order(&self, request: &CreateOrderRequest) -> Result<RazorpayOrder, GatewayError> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(GatewayError::Rejected {
                    status: 401,
                    code: "BAD_REQUEST_ERROR".to_string(),
                    description: "Authentication failed".to_string(),
                });
            }
            Ok(RazorpayOrder {
                id: "order_test123".to_string(),
                amount: request.amount,
                currency: request.currency.clone(),
                receipt: Some(request.receipt.clone()),
                status: Some("created".to_string()),
            })
        }
    }

    fn creator(razorpay: Arc<RecordingRazorpay>) -> OrderCreator {
        let payu = PayuCheckout::new(PayuConfig {
            merchant_key: "merchant".to_string(),
            salt: SecretString::new("salt".to_string()),
            payment_url: Url::parse("https://test.payu.in/_payment").unwrap(),
            verify_response_hash: false,
        });
        OrderCreator::new(razorpay, payu, Url::parse("http://localhost:3000").unwrap())
    }

    fn request(gateway: Option<&str>, amount: Option<u64>) -> PaymentOrderRequest {
        PaymentOrderRequest {
            amount,
            currency: Some("INR".to_string()),
            payment_gateway: gateway.map(str::to_string),
            plan: Some("devotee".to_string()),
            email: Some("a@b.com".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_missing_or_zero_amount_is_rejected_for_every_gateway() {
        let razorpay = Arc::new(RecordingRazorpay::default());
        let creator = creator(razorpay.clone());

        for gateway in [Some("razorpay"), Some("payu"), Some("bogus"), None] {
            for amount in [None, Some(0)] {
                let err = creator.create_order(request(gateway, amount), None).await.unwrap_err();
                assert!(matches!(err, OrderError::MissingAmount));
            }
        }
        assert!(razorpay.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_gateway_is_rejected() {
        let creator = creator(Arc::new(RecordingRazorpay::default()));
        let err = creator
            .create_order(request(Some("bogus"), Some(1000)), None)
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::InvalidGateway));
        assert_eq!(err.to_string(), "Invalid payment gateway");
    }

    #[tokio::test]
    async fn test_unsupported_currency_is_rejected() {
        let creator = creator(Arc::new(RecordingRazorpay::default()));
        let mut req = request(Some("razorpay"), Some(1000));
        req.currency = Some("EUR".to_string());

        let err = creator.create_order(req, None).await.unwrap_err();
        assert!(matches!(err, OrderError::UnsupportedCurrency));
    }

    #[tokio::test]
    async fn test_razorpay_order_keeps_minor_units_on_the_wire() {
        let razorpay = Arc::new(RecordingRazorpay::default());
        let creator = creator(razorpay.clone());
        let mut req = request(Some("razorpay"), Some(49900));
        req.user_id = Some(Value::from(7));

        let result = creator.create_order(req, None).await.unwrap();

        assert_eq!(result.order_id, "order_test123");
        assert_eq!(result.amount, ReportedAmount::Major(MajorUnits::from_minor(49900)));
        assert_eq!(serde_json::to_value(&result.amount).unwrap(), Value::from(499));

        let sent = razorpay.requests.lock().unwrap();
        assert_eq!(sent[0].amount, 49900);
        assert_eq!(sent[0].currency, "INR");
        assert!(sent[0].receipt.starts_with("receipt_"));
        assert!(sent[0].receipt.len() <= 40);
        assert_eq!(sent[0].notes.get("plan"), Some(&Value::from("devotee")));
        assert_eq!(sent[0].notes.get("userId"), Some(&Value::from(7)));
    }

    #[tokio::test]
    async fn test_razorpay_failure_surfaces_gateway_message() {
        let razorpay = Arc::new(RecordingRazorpay {
            fail: true,
            ..Default::default()
        });
        let creator = creator(razorpay);

        let err = creator
            .create_order(request(Some("razorpay"), Some(1000)), None)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Gateway(_)));
        assert_eq!(err.to_string(), "Authentication failed");
    }

    #[tokio::test]
    async fn test_payu_order_example() {
        let creator = creator(Arc::new(RecordingRazorpay::default()));
        let result = creator
            .create_order(request(Some("payu"), Some(100000)), Some("https://gita.example.com"))
            .await
            .unwrap();

        assert_eq!(result.amount, ReportedAmount::Decimal("1000".to_string()));
        let data = result.payment_data.unwrap();
        assert_eq!(result.order_id, data.txnid);
        assert_eq!(data.hash.len(), 128);
        assert!(data.hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(data.firstname, "a");
        assert_eq!(data.productinfo, "devotee");
        assert_eq!(data.surl, "https://gita.example.com/payment/success");
    }

    #[tokio::test]
    async fn test_payu_requires_email() {
        let creator = creator(Arc::new(RecordingRazorpay::default()));
        let mut req = request(Some("payu"), Some(1000));
        req.email = Some("  ".to_string());

        let err = creator.create_order(req, None).await.unwrap_err();
        assert!(matches!(err, OrderError::MissingEmail));
    }

    #[tokio::test]
    async fn test_payu_falls_back_to_default_origin() {
        let creator = creator(Arc::new(RecordingRazorpay::default()));

        for origin in [None, Some("null"), Some("chrome-extension://abc")] {
            let result = creator
                .create_order(request(Some("payu"), Some(1000)), origin)
                .await
                .unwrap();
            let data = result.payment_data.unwrap();
            assert_eq!(data.furl, "http://localhost:3000/payment/failure");
        }
    }

    #[tokio::test]
    async fn test_missing_gateway_routes_by_currency() {
        let razorpay = Arc::new(RecordingRazorpay::default());
        let creator = creator(razorpay.clone());

        let inr = creator.create_order(request(None, Some(1000)), None).await.unwrap();
        assert_eq!(inr.gateway, Gateway::PayU);

        let mut usd = request(None, Some(1000));
        usd.currency = Some("USD".to_string());
        let usd = creator.create_order(usd, None).await.unwrap();
        assert_eq!(usd.gateway, Gateway::Razorpay);
        assert_eq!(razorpay.requests.lock().unwrap()[0].currency, "USD");
    }
}
