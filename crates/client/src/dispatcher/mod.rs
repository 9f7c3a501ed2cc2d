//! Klaviyo action dispatcher.
//!
//! One [`Klaviyo`] per visitor. It holds the visitor's state, talks to
//! Klaviyo's public identify/track and back-in-stock endpoints directly with
//! the public key, and to the subscription router for list membership.
//!
//! # Actions
//!
//! - identity: `identify`, `maybe_identify`, `track`, `load_customer_from_cache`, `reset_customer`
//! - newsletter: `status`, `subscribe`, `subscribe_advanced`, `unsubscribe`
//! - back in stock: `back_in_stock_subscribe`, `back_in_stock_unsubscribe`, `load_watching_list`
//! - events: `product_viewed`, `product_added_to_cart`, `product_removed_from_cart`,
//!   `checkout_started`, `order_placed`, `product_ordered`
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_klaviyo_client::{ClientConfig, Klaviyo, MemoryCache};
//! use storefront_klaviyo_core::User;
//!
//! let klaviyo = Klaviyo::new(ClientConfig::from_env()?, MemoryCache::new())?;
//!
//! klaviyo.product_viewed(&product).await;          // queued: nobody identified yet
//! klaviyo.identify(User::with_email("jo@example.com").into(), true, Default::default()).await?;
//!                                                  // identified: queued view is replayed
//! ```

mod back_in_stock;
mod events;
mod identity;
mod newsletter;
#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod testing;

pub use back_in_stock::BackInStockRequest;
pub use events::*;
pub use identity::TrackEvent;
pub use newsletter::AdvancedSubscription;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use storefront_klaviyo_core::{ApiStatus, Product, User};
use tokio::sync::{Mutex, RwLock};

use crate::cache::CacheStorage;
use crate::config::ClientConfig;
use crate::customer::Customer;
use crate::error::{KlaviyoError, Result};
use crate::state::KlaviyoState;

/// Klaviyo dispatcher for one visitor.
///
/// Cheaply cloneable via `Arc`; clones share state and cache.
pub struct Klaviyo<S> {
    inner: Arc<KlaviyoInner<S>>,
}

impl<S> Clone for Klaviyo<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct KlaviyoInner<S> {
    config: ClientConfig,
    http: reqwest::Client,
    cache: S,
    online: AtomicBool,
    state: RwLock<KlaviyoState>,
    /// Serializes read-modify-write of the cached track queue.
    queue: Mutex<()>,
}

impl<S: CacheStorage> Klaviyo<S> {
    /// Create a dispatcher with empty state, online.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: ClientConfig, cache: S) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(KlaviyoInner {
                config,
                http,
                cache,
                online: AtomicBool::new(true),
                state: RwLock::new(KlaviyoState::default()),
                queue: Mutex::new(()),
            }),
        })
    }

    /// Get a reference to the dispatcher configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Get a reference to the cache backend.
    #[must_use]
    pub fn cache(&self) -> &S {
        &self.inner.cache
    }

    /// Snapshot of the current state.
    pub async fn state(&self) -> KlaviyoState {
        self.inner.state.read().await.clone()
    }

    /// Identified customer, if any.
    pub async fn customer(&self) -> Option<Customer> {
        self.inner.state.read().await.customer.clone()
    }

    /// Whether the client currently has connectivity.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.inner.online.load(Ordering::Relaxed)
    }

    /// Record connectivity changes reported by the host.
    pub fn set_online(&self, online: bool) {
        self.inner.online.store(online, Ordering::Relaxed);
    }

    /// Mirror the storefront's logged-in user (`None` on logout).
    pub async fn set_session_user(&self, user: Option<User>) {
        self.inner.state.write().await.session_user = user;
    }

    /// Whether a back-in-stock watch exists for this product.
    pub async fn is_watching(&self, product: &Product) -> bool {
        self.inner
            .state
            .read()
            .await
            .is_watching(&product.watch_key())
    }

    /// Read and deserialize a cached value.
    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.inner.cache.get_item(key).await? {
            Some(value) if !value.is_null() => Ok(Some(serde_json::from_value(value)?)),
            _ => Ok(None),
        }
    }

    /// Cache a value; failures are logged, never surfaced.
    async fn cache_quietly<T: Serialize + Sync>(&self, key: &str, value: &T) {
        let result = match serde_json::to_value(value) {
            Ok(value) => self.inner.cache.set_item(key, value).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            tracing::warn!(key, error = %e, "Failed to write cache");
        }
    }

    /// Remove a cached value; failures are logged, never surfaced.
    async fn uncache_quietly(&self, key: &str) {
        if let Err(e) = self.inner.cache.remove_item(key).await {
            tracing::warn!(key, error = %e, "Failed to clear cache");
        }
    }

    /// `GET {api_endpoint}/{path}?data=<base64 json>`.
    async fn send_encoded<T: Serialize>(&self, path: &str, payload: &T) -> Result<()> {
        let url = format!("{}/{path}", self.inner.config.api_endpoint);
        let data = encode(payload)?;

        let response = self
            .inner
            .http
            .get(&url)
            .query(&[("data", data)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(KlaviyoError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }

    /// Send JSON to the subscription router and unwrap its envelope.
    async fn send_router<B: Serialize + Sync>(
        &self,
        method: reqwest::Method,
        url: &str,
        body: &B,
    ) -> Result<ApiStatus> {
        let response = self
            .inner
            .http
            .request(method, url)
            .json(body)
            .send()
            .await?;
        read_envelope(response).await
    }
}

/// Base64 of the payload's UTF-8 JSON.
fn encode<T: Serialize>(payload: &T) -> Result<String> {
    Ok(STANDARD.encode(serde_json::to_vec(payload)?))
}

/// Parse a router response; non-2xx becomes `KlaviyoError::Api`.
async fn read_envelope(response: reqwest::Response) -> Result<ApiStatus> {
    let status = response.status();
    let text = response.text().await?;

    let envelope: ApiStatus = serde_json::from_str(&text).map_err(|e| {
        if status.is_success() {
            KlaviyoError::Parse(format!("unexpected router response: {e}"))
        } else {
            KlaviyoError::Api {
                status: status.as_u16(),
                message: text.clone(),
            }
        }
    })?;

    if !status.is_success() {
        let message = envelope
            .result
            .as_str()
            .map_or_else(|| envelope.result.to_string(), String::from);
        return Err(KlaviyoError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(envelope)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_is_standard_base64_of_utf8_json() {
        let encoded = encode(&json!({"token": "Pk", "properties": {"$first_name": "Zoë"}})).unwrap();
        let decoded: serde_json::Value =
            serde_json::from_slice(&STANDARD.decode(encoded).unwrap()).unwrap();
        assert_eq!(decoded["properties"]["$first_name"], "Zoë");
    }
}
