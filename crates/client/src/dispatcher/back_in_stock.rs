//! Back-in-stock notifications.
//!
//! Requests go straight to Klaviyo's onsite back-in-stock form endpoint as
//! multipart forms. Klaviyo keeps no per-visitor watch list we could read
//! back, so the watch set lives in state and cache only.

use reqwest::Method;
use reqwest::multipart::Form;
use serde_json::Value;
use storefront_klaviyo_core::Product;

use super::Klaviyo;
use crate::cache::{CacheStorage, WATCHING_KEY};
use crate::error::{KlaviyoError, Result};

/// Input of the back-in-stock actions.
#[derive(Debug, Clone)]
pub struct BackInStockRequest {
    pub product: Product,
    pub email: String,
    /// Sent on unsubscribe; subscribe derives it from configuration.
    pub subscribe_for_newsletter: bool,
    /// Persist the watch set after a successful request.
    pub use_cache: bool,
}

impl BackInStockRequest {
    /// Request for `product`, cached, without newsletter signup.
    pub fn new(product: Product, email: impl Into<String>) -> Self {
        Self {
            product,
            email: email.into(),
            subscribe_for_newsletter: false,
            use_cache: true,
        }
    }
}

impl<S: CacheStorage> Klaviyo<S> {
    /// Ask to be notified when `request.product` is back in stock.
    ///
    /// Returns `None` without a request when already watching.
    ///
    /// # Errors
    ///
    /// Returns `Rejected` when Klaviyo answers without `"success": true`, or
    /// the request error.
    pub async fn back_in_stock_subscribe(&self, request: &BackInStockRequest) -> Result<Option<Value>> {
        let key = request.product.watch_key();
        if self.inner.state.read().await.is_watching(&key) {
            return Ok(None);
        }

        let config = &self.inner.config;
        let list_id = config.back_in_stock_list_id.clone();
        let form = Form::new()
            .text("a", config.public_key.clone())
            .text("email", request.email.clone())
            .text("g", list_id.clone().unwrap_or_default())
            .text("variant", request.product.id.to_string())
            .text("product", request.product.id.to_string())
            .text("platform", config.platform.clone())
            .text("subscribe_for_newsletter", list_id.is_some().to_string())
            .text("store", config.store_id.clone());

        let body = self.send_form(Method::POST, form).await?;

        let mut state = self.inner.state.write().await;
        state.watch(key);
        let watching = state.back_in_stock_watching.clone();
        drop(state);

        tracing::debug!(sku = %request.product.sku, "Back-in-stock watch added");
        if request.use_cache {
            self.cache_quietly(WATCHING_KEY, &watching).await;
        }

        Ok(Some(body))
    }

    /// Stop back-in-stock notifications for `request.product`.
    ///
    /// Returns `None` without a request unless watching.
    ///
    /// # Errors
    ///
    /// Returns `Rejected` when Klaviyo answers without `"success": true`, or
    /// the request error.
    pub async fn back_in_stock_unsubscribe(&self, request: &BackInStockRequest) -> Result<Option<Value>> {
        let key = request.product.watch_key();
        if !self.inner.state.read().await.is_watching(&key) {
            return Ok(None);
        }

        let config = &self.inner.config;
        let product = request
            .product
            .parent_sku
            .clone()
            .unwrap_or_else(|| request.product.sku.clone());
        let form = Form::new()
            .text("a", config.public_key.clone())
            .text("email", request.email.clone())
            .text("g", config.back_in_stock_list_id.clone().unwrap_or_default())
            .text("variant", request.product.sku.clone())
            .text("product", product)
            .text("platform", config.platform.clone())
            .text(
                "subscribe_for_newsletter",
                request.subscribe_for_newsletter.to_string(),
            );

        let body = self.send_form(Method::DELETE, form).await?;

        let mut state = self.inner.state.write().await;
        state.unwatch(&key);
        let watching = state.back_in_stock_watching.clone();
        drop(state);

        tracing::debug!(sku = %request.product.sku, "Back-in-stock watch removed");
        if request.use_cache {
            self.cache_quietly(WATCHING_KEY, &watching).await;
        }

        Ok(Some(body))
    }

    /// Restore the watch list from cache.
    ///
    /// # Errors
    ///
    /// Returns `NotImplemented` on a cache miss or with `use_cache` off, since
    /// there is no server-side list to fall back to.
    pub async fn load_watching_list(&self, use_cache: bool) -> Result<Vec<String>> {
        if use_cache {
            if let Some(watching) = self.cached::<Vec<String>>(WATCHING_KEY).await? {
                self.inner.state.write().await.back_in_stock_watching = watching.clone();
                return Ok(watching);
            }
        }
        Err(KlaviyoError::NotImplemented("server-side back-in-stock watch list"))
    }

    async fn send_form(&self, method: Method, form: Form) -> Result<Value> {
        let response = self
            .inner
            .http
            .request(method, &self.inner.config.back_in_stock_url)
            .multipart(form)
            .send()
            .await?;

        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text)?;

        if body.get("success").and_then(Value::as_bool) == Some(true) {
            Ok(body)
        } else {
            tracing::debug!(response = %body, "Back-in-stock request rejected");
            Err(KlaviyoError::Rejected(body))
        }
    }
}
