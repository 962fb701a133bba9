pub mod order_creator;
pub mod payment_verifier;
pub mod payu;
pub mod razorpay;
pub mod upstream_client;

pub use order_creator::{OrderCreator, OrderError};
pub use payment_verifier::{PaymentVerifier, VerifyError};
pub use payu::PayuCheckout;
pub use razorpay::{GatewayError, RazorpayApi, RazorpayClient};
pub use upstream_client::{ForwardError, UpstreamClient};
