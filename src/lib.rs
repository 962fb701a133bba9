pub mod app;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

pub use app::config::{Config, ConfigError};
pub use app::router;
pub use app::state::AppState;
