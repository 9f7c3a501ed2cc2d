//! Klaviyo list API client used by the subscription router.
//!
//! Every call targets `{endpoint}/v2/list/{list_id}/subscribe` with the
//! account's private key in the `api-key` header. Responses are relayed, not
//! interpreted: whatever status and body Klaviyo returns goes back to the caller.

use reqwest::Method;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use storefront_klaviyo_core::Profile;
use thiserror::Error;

/// Header carrying the account's private key.
const API_KEY_HEADER: &str = "api-key";

/// Errors that can occur when forwarding to the Klaviyo list API.
#[derive(Debug, Error)]
pub enum KlaviyoError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured private key cannot be sent as a header.
    #[error("Invalid API key format: {0}")]
    InvalidApiKey(String),
}

/// Body of list membership lookups and removals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailsPayload {
    pub emails: Vec<String>,
}

/// Body of list subscriptions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfilesPayload {
    pub profiles: Vec<Profile>,
}

/// A resolved list endpoint and the key that authorizes it.
#[derive(Debug, Clone)]
pub struct ListTarget {
    pub url: String,
    pub api_key: SecretString,
}

impl ListTarget {
    /// Build the subscribe URL for a list under an API base URL.
    #[must_use]
    pub fn new(endpoint: &str, list_id: &str, api_key: SecretString) -> Self {
        Self {
            url: format!("{endpoint}/v2/list/{list_id}/subscribe"),
            api_key,
        }
    }
}

/// Upstream response as received.
#[derive(Debug, Clone, PartialEq)]
pub struct Relay {
    pub status: u16,
    pub body: Value,
}

/// Klaviyo list API client.
#[derive(Clone)]
pub struct ListClient {
    client: reqwest::Client,
}

impl ListClient {
    /// Create a new list API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new() -> Result<Self, KlaviyoError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }

    /// Send `body` to the list endpoint with `method` and relay the response.
    ///
    /// # Errors
    ///
    /// Returns error only when no response was received; non-2xx responses are
    /// relayed as they are.
    pub async fn forward<B: Serialize + Sync>(
        &self,
        method: Method,
        target: &ListTarget,
        body: &B,
    ) -> Result<Relay, KlaviyoError> {
        let api_key = HeaderValue::from_str(target.api_key.expose_secret())
            .map_err(|e| KlaviyoError::InvalidApiKey(e.to_string()))?;

        let response = self
            .client
            .request(method.clone(), &target.url)
            .header(API_KEY_HEADER, api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;

        tracing::debug!(%method, status, "Klaviyo list API responded");

        Ok(Relay {
            status,
            body: parse_body(text),
        })
    }
}

/// JSON when the body parses, raw text otherwise, `null` when empty.
fn parse_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}
