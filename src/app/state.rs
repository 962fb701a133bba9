use reqwest::Client;
use std::sync::Arc;

use crate::app::config::Config;
use crate::services::{
    OrderCreator, PaymentVerifier, PayuCheckout, RazorpayApi, RazorpayClient, UpstreamClient,
};

/// Shared, immutable handler context.
pub struct AppState {
    pub orders: OrderCreator,
    pub verifier: PaymentVerifier,
    pub payu: PayuCheckout,
    pub upstream: UpstreamClient,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        let razorpay = Arc::new(RazorpayClient::new(client.clone(), config.razorpay.clone()));
        Ok(Self::with_razorpay(config, razorpay, client))
    }

    /// Builds the context around an existing Razorpay implementation.
    pub fn with_razorpay(config: &Config, razorpay: Arc<dyn RazorpayApi>, client: Client) -> Self {
        let payu = PayuCheckout::new(config.payu.clone());

        Self {
            orders: OrderCreator::new(razorpay, payu.clone(), config.default_origin.clone()),
            verifier: PaymentVerifier::new(config.razorpay.key_secret.clone(), payu.clone()),
            payu,
            upstream: UpstreamClient::new(client, &config.upstream_api_url),
        }
    }
}
