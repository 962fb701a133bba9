use secrecy::SecretString;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid URL for {key}: {source}")]
    InvalidUrl {
        key: &'static str,
        source: url::ParseError,
    },
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub razorpay: RazorpayConfig,
    pub payu: PayuConfig,
    pub upstream_api_url: Url,
    pub default_origin: Url,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: SecretString,
    pub api_base_url: Url,
}

#[derive(Debug, Clone)]
pub struct PayuConfig {
    pub merchant_key: String,
    pub salt: SecretString,
    pub payment_url: Url,
    pub verify_response_hash: bool,
}

/// Optional TOML file layer. Every field may be overridden from the environment.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub upstream_api_url: Option<String>,
    pub default_origin: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub razorpay: FileRazorpayConfig,
    pub payu: FilePayuConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileRazorpayConfig {
    pub key_id: Option<String>,
    pub key_secret: Option<String>,
    pub api_base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilePayuConfig {
    pub merchant_key: Option<String>,
    pub salt: Option<String>,
    pub payment_url: Option<String>,
    pub verify_response_hash: Option<bool>,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }
}

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_RAZORPAY_API_URL: &str = "https://api.razorpay.com/v1";
const DEFAULT_PAYU_PAYMENT_URL: &str = "https://test.payu.in/_payment";
const DEFAULT_UPSTREAM_API_URL: &str = "http://localhost:8000";
const DEFAULT_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => FileConfig::read(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(file, |key| env::var(key).ok())
    }

    /// Merges the file layer with environment values looked up through `env`.
    pub fn resolve(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let lookup = |key: &str, fallback: Option<String>| {
            env(key)
                .filter(|value| !value.trim().is_empty())
                .or(fallback)
                .filter(|value| !value.trim().is_empty())
        };

        let server_port = match env("PORT").filter(|v| !v.trim().is_empty()) {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue { key: "PORT", value })?,
            None => file.port.unwrap_or(DEFAULT_PORT),
        };

        let request_timeout_ms = match env("REQUEST_TIMEOUT_MS").filter(|v| !v.trim().is_empty()) {
            Some(value) => value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: "REQUEST_TIMEOUT_MS",
                value,
            })?,
            None => file.request_timeout_ms.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
        };

        let verify_response_hash = match env("PAYU_VERIFY_RESPONSE_HASH")
            .filter(|v| !v.trim().is_empty())
        {
            Some(value) => parse_bool(&value).ok_or(ConfigError::InvalidValue {
                key: "PAYU_VERIFY_RESPONSE_HASH",
                value,
            })?,
            None => file.payu.verify_response_hash.unwrap_or(false),
        };

        let razorpay = RazorpayConfig {
            key_id: lookup("RAZORPAY_KEY_ID", file.razorpay.key_id)
                .ok_or(ConfigError::Missing("RAZORPAY_KEY_ID"))?,
            key_secret: lookup("RAZORPAY_KEY_SECRET", file.razorpay.key_secret)
                .map(SecretString::new)
                .ok_or(ConfigError::Missing("RAZORPAY_KEY_SECRET"))?,
            api_base_url: parse_url(
                "RAZORPAY_API_URL",
                lookup("RAZORPAY_API_URL", file.razorpay.api_base_url),
                DEFAULT_RAZORPAY_API_URL,
            )?,
        };

        let payu = PayuConfig {
            merchant_key: lookup("PAYU_MERCHANT_KEY", file.payu.merchant_key)
                .ok_or(ConfigError::Missing("PAYU_MERCHANT_KEY"))?,
            salt: lookup("PAYU_SALT", file.payu.salt)
                .map(SecretString::new)
                .ok_or(ConfigError::Missing("PAYU_SALT"))?,
            payment_url: parse_url(
                "PAYU_PAYMENT_URL",
                lookup("PAYU_PAYMENT_URL", file.payu.payment_url),
                DEFAULT_PAYU_PAYMENT_URL,
            )?,
            verify_response_hash,
        };

        Ok(Self {
            server_port,
            razorpay,
            payu,
            upstream_api_url: parse_url(
                "NEXT_PUBLIC_API_URL",
                lookup("NEXT_PUBLIC_API_URL", file.upstream_api_url),
                DEFAULT_UPSTREAM_API_URL,
            )?,
            default_origin: parse_url(
                "DEFAULT_ORIGIN",
                lookup("DEFAULT_ORIGIN", file.default_origin),
                DEFAULT_ORIGIN,
            )?,
            request_timeout: Duration::from_millis(request_timeout_ms),
        })
    }
}

fn parse_url(key: &'static str, value: Option<String>, default: &str) -> Result<Url, ConfigError> {
    let raw = value.as_deref().unwrap_or(default);
    Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl { key, source })
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
