pub mod error;
pub mod hash;
pub mod payments;
pub mod proxy;

pub use error::ApiError;
