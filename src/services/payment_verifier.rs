use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use crate::models::payment::{Gateway, PaymentVerificationRequest, PaymentVerificationResult};
use crate::services::payu::{PayuCheckout, PayuResponseFields};
use crate::services::razorpay::verify_payment_signature;

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("Payment ID is required")]
    MissingPaymentId,
    #[error("Order ID is required")]
    MissingOrderId,
    #[error("Signature is required")]
    MissingSignature,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Payment {0}")]
    PaymentStatus(String),
    #[error("Invalid payment gateway")]
    InvalidGateway,
}

pub struct PaymentVerifier {
    razorpay_key_secret: SecretString,
    payu: PayuCheckout,
}

impl PaymentVerifier {
    pub fn new(razorpay_key_secret: SecretString, payu: PayuCheckout) -> Self {
        Self {
            razorpay_key_secret,
            payu,
        }
    }

    pub fn verify(
        &self,
        request: &PaymentVerificationRequest,
    ) -> Result<PaymentVerificationResult, VerifyError> {
        let payment_id = required(request.payment_id.as_deref()).ok_or(VerifyError::MissingPaymentId)?;
        let order_id = required(request.order_id.as_deref()).ok_or(VerifyError::MissingOrderId)?;

        let gateway = request
            .payment_gateway
            .as_deref()
            .and_then(|raw| raw.parse::<Gateway>().ok())
            .ok_or_else(|| {
                warn!("Verification for {} with invalid gateway {:?}", order_id, request.payment_gateway);
                VerifyError::InvalidGateway
            })?;

        match gateway {
            Gateway::Razorpay => self.verify_razorpay(request, payment_id, order_id)?,
            Gateway::PayU => self.verify_payu(request, payment_id, order_id)?,
        }

        // Nothing is persisted here; the upstream API owns subscription state.
        info!("Verified {} payment {} for order {}", gateway, payment_id, order_id);

        Ok(PaymentVerificationResult {
            success: true,
            message: "Payment verified successfully".to_string(),
            payment_id: payment_id.to_string(),
            order_id: order_id.to_string(),
        })
    }

    fn verify_razorpay(
        &self,
        request: &PaymentVerificationRequest,
        payment_id: &str,
        order_id: &str,
    ) -> Result<(), VerifyError> {
        let signature = required(request.signature.as_deref()).ok_or_else(|| {
            warn!("Razorpay verification for {} without signature", order_id);
            VerifyError::MissingSignature
        })?;

        let key_secret = self.razorpay_key_secret.expose_secret();
        if !verify_payment_signature(key_secret, order_id, payment_id, signature) {
            warn!("Razorpay signature mismatch for order {} payment {}", order_id, payment_id);
            return Err(VerifyError::InvalidSignature);
        }

        Ok(())
    }

    fn verify_payu(
        &self,
        request: &PaymentVerificationRequest,
        payment_id: &str,
        order_id: &str,
    ) -> Result<(), VerifyError> {
        if let Some(status) = reported_status(request) {
            if !status.eq_ignore_ascii_case("success") {
                warn!("PayU payment {} for {} reported status {}", payment_id, order_id, status);
                return Err(VerifyError::PaymentStatus(status));
            }
        }

        if !self.payu.verifies_response_hash() {
            warn!(
                "PayU response hash not checked for order {}; accepting on payment/order ids",
                order_id
            );
            return Ok(());
        }

        let received = request
            .additional_param("hash")
            .or_else(|| request.signature.clone())
            .filter(|hash| !hash.is_empty())
            .ok_or_else(|| {
                warn!("PayU verification for {} without response hash", order_id);
                VerifyError::InvalidSignature
            })?;

        let fields = self.response_fields(request, order_id);
        if !self.payu.verify_response(&fields, &received) {
            warn!("PayU reverse hash mismatch for order {}", order_id);
            return Err(VerifyError::InvalidSignature);
        }

        Ok(())
    }

    fn response_fields(&self, request: &PaymentVerificationRequest, order_id: &str) -> PayuResponseFields {
        let param = |name: &str| request.additional_param(name).unwrap_or_default();

        let mut udf: [String; 10] = Default::default();
        for (index, slot) in udf.iter_mut().enumerate() {
            *slot = param(&format!("udf{}", index + 1));
        }

        PayuResponseFields {
            key: request
                .additional_param("key")
                .unwrap_or_else(|| self.payu.merchant_key().to_string()),
            txnid: request
                .additional_param("txnid")
                .unwrap_or_else(|| order_id.to_string()),
            amount: param("amount"),
            productinfo: param("productinfo"),
            firstname: param("firstname"),
            email: param("email"),
            status: reported_status(request).unwrap_or_default(),
            udf,
            additional_charges: request.additional_param("additionalCharges"),
        }
    }
}

/// Top-level `status` wins over `additionalParams.status`; blank values count as absent.
fn reported_status(request: &PaymentVerificationRequest) -> Option<String> {
    let present = |value: Option<String>| value.filter(|s| !s.trim().is_empty());
    present(request.status.clone()).or_else(|| present(request.additional_param("status")))
}

fn required(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
