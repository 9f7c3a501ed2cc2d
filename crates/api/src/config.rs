//! Router configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `KLAVIYO_ACCOUNTS` - JSON object of per-store accounts (see [`crate::accounts`])
//!
//! ## Optional
//! - `KLAVIYO_API_HOST` - Bind address (default: 127.0.0.1)
//! - `KLAVIYO_API_PORT` - Listen port (default: 3010)
//! - `KLAVIYO_ENDPOINT` - Klaviyo API base URL (default: <https://a.klaviyo.com/api>)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};

use secrecy::ExposeSecret;
use thiserror::Error;
use url::Url;

use crate::accounts::{AccountConfig, Accounts};

/// Default Klaviyo API base URL.
pub const DEFAULT_ENDPOINT: &str = "https://a.klaviyo.com/api";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Subscription router configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Klaviyo endpoint and accounts
    pub klaviyo: KlaviyoConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., production, staging)
    pub sentry_environment: Option<String>,
    /// Fraction of errors reported to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced to Sentry
    pub sentry_traces_sample_rate: f32,
}

/// Klaviyo list API configuration.
#[derive(Debug, Clone)]
pub struct KlaviyoConfig {
    /// Base URL for the list API, without trailing slash
    pub endpoint: String,
    /// Per-store accounts in declaration order
    pub accounts: Accounts,
}

impl KlaviyoConfig {
    /// Base URL used for an account: its own override, else the global endpoint.
    #[must_use]
    pub fn endpoint_for<'a>(&'a self, account: &'a AccountConfig) -> &'a str {
        account.endpoint.as_deref().unwrap_or(&self.endpoint)
    }

    fn from_env() -> Result<Self, ConfigError> {
        let endpoint = parse_endpoint(
            "KLAVIYO_ENDPOINT",
            &get_env_or_default("KLAVIYO_ENDPOINT", DEFAULT_ENDPOINT),
        )?;

        let raw_accounts = get_required_env("KLAVIYO_ACCOUNTS")?;
        let accounts = Accounts::from_json(&raw_accounts).map_err(|e| {
            ConfigError::InvalidEnvVar("KLAVIYO_ACCOUNTS".to_string(), e.to_string())
        })?;

        if accounts.is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "KLAVIYO_ACCOUNTS".to_string(),
                "at least one account is required".to_string(),
            ));
        }

        for (store, account) in accounts.iter() {
            let var_name = format!("KLAVIYO_ACCOUNTS.{store}.private_key");
            validate_secret_strength(account.private_key.expose_secret(), &var_name)?;

            if let Some(endpoint) = &account.endpoint {
                parse_endpoint(&format!("KLAVIYO_ACCOUNTS.{store}.endpoint"), endpoint)?;
            }
        }

        Ok(Self { endpoint, accounts })
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if a private key looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("KLAVIYO_API_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("KLAVIYO_API_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("KLAVIYO_API_PORT", "3010")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("KLAVIYO_API_PORT".to_string(), e.to_string())
            })?;

        let klaviyo = KlaviyoConfig::from_env()?;

        Ok(Self {
            host,
            port,
            klaviyo,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: get_rate("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a sample rate between 0.0 and 1.0.
fn get_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };

    let rate = raw
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ))
    }
}

/// Validate an endpoint URL and strip any trailing slash.
fn parse_endpoint(var_name: &str, raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    Ok(raw.trim_end_matches('/').to_string())
}

/// Validate that a secret is present and not a placeholder.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    if secret.trim().is_empty() {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            "must not be empty".to_string(),
        ));
    }

    let lower = secret.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}
