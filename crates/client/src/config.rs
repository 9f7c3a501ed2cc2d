//! Dispatcher configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `KLAVIYO_PUBLIC_KEY` - Public site ID sent as `token` / `a`
//!
//! ## Optional
//! - `KLAVIYO_ENDPOINT` - Base URL of the identify/track API (default: <https://a.klaviyo.com/api>)
//! - `KLAVIYO_SUBSCRIBE_URL` - Subscription router `/subscribe` (default: <http://127.0.0.1:3010/subscribe>)
//! - `KLAVIYO_SUBSCRIBE_ADVANCED_URL` - Subscription router `/subscribe-advanced`
//! - `KLAVIYO_BACK_IN_STOCK_URL` - Back-in-stock form endpoint
//! - `KLAVIYO_BACK_IN_STOCK_LIST_ID` - List joined by back-in-stock subscribers
//! - `KLAVIYO_PLATFORM` - Platform reported to back-in-stock (default: `magento_two`)
//! - `KLAVIYO_STORE_CODE` - Store code sent to the router (default: `default`)
//! - `KLAVIYO_STORE_ID` - Store ID sent to back-in-stock (default: `1`)

use storefront_klaviyo_core::StoreCode;
use thiserror::Error;
use url::Url;

/// Default base URL of Klaviyo's identify/track API.
pub const DEFAULT_API_ENDPOINT: &str = "https://a.klaviyo.com/api";
/// Default subscription router endpoint.
pub const DEFAULT_SUBSCRIBE_URL: &str = "http://127.0.0.1:3010/subscribe";
/// Default advanced subscription router endpoint.
pub const DEFAULT_SUBSCRIBE_ADVANCED_URL: &str = "http://127.0.0.1:3010/subscribe-advanced";
/// Default back-in-stock form endpoint.
pub const DEFAULT_BACK_IN_STOCK_URL: &str =
    "https://a.klaviyo.com/onsite/components/back-in-stock/subscribe";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Dispatcher configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Public site ID (safe to expose in browser)
    pub public_key: String,
    /// Identify/track API base URL, without trailing slash
    pub api_endpoint: String,
    /// Subscription router `/subscribe` URL
    pub subscribe_url: String,
    /// Subscription router `/subscribe-advanced` URL
    pub subscribe_advanced_url: String,
    /// Back-in-stock form endpoint
    pub back_in_stock_url: String,
    /// List back-in-stock subscribers are added to, if any
    pub back_in_stock_list_id: Option<String>,
    /// Platform name reported with back-in-stock requests
    pub platform: String,
    /// Store code sent to the subscription router
    pub store_code: StoreCode,
    /// Store ID sent with back-in-stock requests
    pub store_id: String,
}

impl ClientConfig {
    /// Configuration with defaults for everything but the public key.
    pub fn new(public_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            subscribe_url: DEFAULT_SUBSCRIBE_URL.to_string(),
            subscribe_advanced_url: DEFAULT_SUBSCRIBE_ADVANCED_URL.to_string(),
            back_in_stock_url: DEFAULT_BACK_IN_STOCK_URL.to_string(),
            back_in_stock_list_id: None,
            platform: "magento_two".to_string(),
            store_code: StoreCode::new("default"),
            store_id: "1".to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the public key is missing or a URL is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let defaults = Self::new(get_required_env("KLAVIYO_PUBLIC_KEY")?);

        Ok(Self {
            api_endpoint: get_url("KLAVIYO_ENDPOINT", &defaults.api_endpoint)?
                .trim_end_matches('/')
                .to_string(),
            subscribe_url: get_url("KLAVIYO_SUBSCRIBE_URL", &defaults.subscribe_url)?,
            subscribe_advanced_url: get_url(
                "KLAVIYO_SUBSCRIBE_ADVANCED_URL",
                &defaults.subscribe_advanced_url,
            )?,
            back_in_stock_url: get_url("KLAVIYO_BACK_IN_STOCK_URL", &defaults.back_in_stock_url)?,
            back_in_stock_list_id: get_optional_env("KLAVIYO_BACK_IN_STOCK_LIST_ID"),
            platform: get_optional_env("KLAVIYO_PLATFORM").unwrap_or(defaults.platform),
            store_code: get_optional_env("KLAVIYO_STORE_CODE")
                .map_or(defaults.store_code, StoreCode::new),
            store_id: get_optional_env("KLAVIYO_STORE_ID").unwrap_or(defaults.store_id),
            public_key: defaults.public_key,
        })
    }
}

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    get_optional_env(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// URL from the environment, or the default; validated either way.
fn get_url(key: &str, default: &str) -> Result<String, ConfigError> {
    let raw = get_optional_env(key).unwrap_or_else(|| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    Ok(raw)
}
