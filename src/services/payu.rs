use chrono::Utc;
use rand::Rng;
use secrecy::ExposeSecret;
use sha2::{Digest, Sha512};
use tracing::debug;
use url::Url;

use crate::app::config::PayuConfig;
use crate::models::payment::PayuPaymentData;

/// Field set covered by PayU's request hash.
///
/// sha512(key|txnid|amount|productinfo|firstname|email|udf1|...|udf10|salt)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayuHashFields {
    pub key: String,
    pub txnid: String,
    pub amount: String,
    pub productinfo: String,
    pub firstname: String,
    pub email: String,
    pub udf: [String; 10],
}

/// Field set PayU posts back to surl/furl.
///
/// Reverse hash: sha512([additionalCharges|]salt|status|udf10|...|udf1|email|firstname|productinfo|amount|txnid|key)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayuResponseFields {
    pub key: String,
    pub txnid: String,
    pub amount: String,
    pub productinfo: String,
    pub firstname: String,
    pub email: String,
    pub status: String,
    pub udf: [String; 10],
    pub additional_charges: Option<String>,
}

fn sha512_hex<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    let joined = segments.into_iter().collect::<Vec<_>>().join("|");
    let mut hasher = Sha512::new();
    hasher.update(joined.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn request_hash(fields: &PayuHashFields, salt: &str) -> String {
    let head = [
        fields.key.as_str(),
        fields.txnid.as_str(),
        fields.amount.as_str(),
        fields.productinfo.as_str(),
        fields.firstname.as_str(),
        fields.email.as_str(),
    ];

    sha512_hex(
        head.into_iter()
            .chain(fields.udf.iter().map(String::as_str))
            .chain(std::iter::once(salt)),
    )
}

pub fn response_hash(fields: &PayuResponseFields, salt: &str) -> String {
    let tail = [
        fields.email.as_str(),
        fields.firstname.as_str(),
        fields.productinfo.as_str(),
        fields.amount.as_str(),
        fields.txnid.as_str(),
        fields.key.as_str(),
    ];

    let charges = fields
        .additional_charges
        .as_deref()
        .filter(|charges| !charges.is_empty());

    sha512_hex(
        charges
            .into_iter()
            .chain([salt, fields.status.as_str()])
            .chain(fields.udf.iter().rev().map(String::as_str))
            .chain(tail),
    )
}

/// Checkout details for a PayU order, already validated by the caller.
#[derive(Debug, Clone)]
pub struct PayuOrderInput<'a> {
    pub amount: String,
    pub productinfo: &'a str,
    pub firstname: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub origin: &'a Url,
}

#[derive(Debug, Clone)]
pub struct PayuCheckout {
    config: PayuConfig,
}

impl PayuCheckout {
    pub fn new(config: PayuConfig) -> Self {
        Self { config }
    }

    pub fn merchant_key(&self) -> &str {
        &self.config.merchant_key
    }

    pub fn verifies_response_hash(&self) -> bool {
        self.config.verify_response_hash
    }

    pub fn generate_txnid() -> String {
        let suffix: u32 = rand::thread_rng().gen_range(0..10000);
        format!("txn_{}{}", Utc::now().timestamp_millis(), suffix)
    }

    pub fn hash(&self, fields: &PayuHashFields) -> String {
        request_hash(fields, self.config.salt.expose_secret())
    }

    pub fn build_order(&self, input: PayuOrderInput<'_>) -> PayuPaymentData {
        let txnid = Self::generate_txnid();
        let fields = PayuHashFields {
            key: self.config.merchant_key.clone(),
            txnid: txnid.clone(),
            amount: input.amount.clone(),
            productinfo: input.productinfo.to_string(),
            firstname: input.firstname.to_string(),
            email: input.email.to_string(),
            udf: Default::default(),
        };
        let hash = self.hash(&fields);

        let origin = input.origin.origin().ascii_serialization();
        debug!("Built PayU order {} for {}", txnid, origin);

        PayuPaymentData {
            key: fields.key,
            txnid,
            amount: input.amount,
            productinfo: fields.productinfo,
            firstname: fields.firstname,
            email: fields.email,
            phone: input.phone.to_string(),
            surl: format!("{}/payment/success", origin),
            furl: format!("{}/payment/failure", origin),
            hash,
            action: self.config.payment_url.to_string(),
        }
    }

    /// Recomputes the reverse hash and compares it with the one PayU sent.
    pub fn verify_response(&self, fields: &PayuResponseFields, received_hash: &str) -> bool {
        response_hash(fields, self.config.salt.expose_secret()) == received_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use secrecy::SecretString;

    fn test_config() -> PayuConfig {
        PayuConfig {
            merchant_key: "gtKFFx".to_string(),
            salt: SecretString::new("eCwWELxi".to_string()),
            payment_url: Url::parse("https://test.payu.in/_payment").unwrap(),
            verify_response_hash: false,
        }
    }

    fn sample_fields() -> PayuHashFields {
        PayuHashFields {
            key: "gtKFFx".to_string(),
            txnid: "txn_17000000000001234".to_string(),
            amount: "1000".to_string(),
            productinfo: "devotee".to_string(),
            firstname: "a".to_string(),
            email: "a@b.com".to_string(),
            udf: Default::default(),
        }
    }

    fn independent_sha512(input: &str) -> String {
        let mut hasher = Sha512::new();
        hasher.update(input.as_bytes());
        hex::encode(hasher.finalize())
    }

    #[test]
    fn test_request_hash_matches_pipe_formula() {
        let expected = independent_sha512(
            "gtKFFx|txn_17000000000001234|1000|devotee|a|a@b.com|||||||||||eCwWELxi",
        );
        assert_eq!(request_hash(&sample_fields(), "eCwWELxi"), expected);
    }

    #[test]
    fn test_request_hash_includes_udf_fields_in_order() {
        let mut fields = sample_fields();
        fields.udf[0] = "plan".to_string();
        fields.udf[4] = "user".to_string();

        let expected = independent_sha512(
            "gtKFFx|txn_17000000000001234|1000|devotee|a|a@b.com|plan||||user||||||eCwWELxi",
        );
        assert_eq!(request_hash(&fields, "eCwWELxi"), expected);
    }

    #[test]
    fn test_response_hash_matches_reverse_formula() {
        let fields = PayuResponseFields {
            key: "gtKFFx".to_string(),
            txnid: "txn_1".to_string(),
            amount: "1000".to_string(),
            productinfo: "devotee".to_string(),
            firstname: "a".to_string(),
            email: "a@b.com".to_string(),
            status: "success".to_string(),
            udf: Default::default(),
            additional_charges: None,
        };

        let expected = independent_sha512(
            "eCwWELxi|success|||||||||||a@b.com|a|devotee|1000|txn_1|gtKFFx",
        );
        assert_eq!(response_hash(&fields, "eCwWELxi"), expected);

        let with_charges = PayuResponseFields {
            additional_charges: Some("15.00".to_string()),
            ..fields
        };
        let expected = independent_sha512(
            "15.00|eCwWELxi|success|||||||||||a@b.com|a|devotee|1000|txn_1|gtKFFx",
        );
        assert_eq!(response_hash(&with_charges, "eCwWELxi"), expected);
    }

    #[test]
    fn test_build_order_fields() {
        let checkout = PayuCheckout::new(test_config());
        let origin = Url::parse("https://gita.example.com/pricing").unwrap();

        let data = checkout.build_order(PayuOrderInput {
            amount: "1000".to_string(),
            productinfo: "devotee",
            firstname: "a",
            email: "a@b.com",
            phone: "",
            origin: &origin,
        });

        assert!(data.txnid.starts_with("txn_"));
        assert_eq!(data.amount, "1000");
        assert_eq!(data.surl, "https://gita.example.com/payment/success");
        assert_eq!(data.furl, "https://gita.example.com/payment/failure");
        assert_eq!(data.action, "https://test.payu.in/_payment");
        assert_eq!(data.hash.len(), 128);

        let expected = independent_sha512(&format!(
            "gtKFFx|{}|1000|devotee|a|a@b.com|||||||||||eCwWELxi",
            data.txnid
        ));
        assert_eq!(data.hash, expected);
    }

    #[test]
    fn test_generated_txnids_are_numeric_after_prefix() {
        let txnid = PayuCheckout::generate_txnid();
        let digits = txnid.trim_start_matches("txn_");
        assert!(!digits.is_empty());
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }

    proptest! {
        #[test]
        fn request_hash_is_deterministic(amount in "[0-9]{1,7}", email in "[a-z]{1,8}@[a-z]{1,8}\\.com") {
            let fields = PayuHashFields { amount, email, ..sample_fields() };
            prop_assert_eq!(request_hash(&fields, "salt"), request_hash(&fields, "salt"));
        }

        #[test]
        fn changing_amount_changes_hash(a in 1u64..10_000_000, b in 1u64..10_000_000) {
            prop_assume!(a != b);
            let first = PayuHashFields { amount: a.to_string(), ..sample_fields() };
            let second = PayuHashFields { amount: b.to_string(), ..sample_fields() };
            prop_assert_ne!(request_hash(&first, "salt"), request_hash(&second, "salt"));
        }
    }
}
