//! Application state shared across handlers.

use std::sync::Arc;

use storefront_klaviyo_core::{ListKey, StoreCode};

use crate::accounts::AccountError;
use crate::config::ApiConfig;
use crate::services::{KlaviyoError, ListClient, ListTarget};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`; configuration is immutable
/// after startup.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    klaviyo: ListClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: ApiConfig) -> Result<Self, KlaviyoError> {
        let klaviyo = ListClient::new()?;

        Ok(Self {
            inner: Arc::new(AppStateInner { config, klaviyo }),
        })
    }

    /// Get a reference to the router configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the Klaviyo list API client.
    #[must_use]
    pub fn klaviyo(&self) -> &ListClient {
        &self.inner.klaviyo
    }

    /// Resolve a store code and list key to the list endpoint to call.
    ///
    /// # Errors
    ///
    /// Returns `AccountError` when the store or its list is not configured.
    pub fn list_target(
        &self,
        store: Option<&StoreCode>,
        list: Option<&ListKey>,
    ) -> Result<ListTarget, AccountError> {
        let klaviyo = &self.config().klaviyo;
        let (store_code, account) = klaviyo.accounts.resolve(store)?;
        let list_id = account.list_id(store_code, list)?;

        Ok(ListTarget::new(
            klaviyo.endpoint_for(account),
            list_id,
            account.private_key.clone(),
        ))
    }
}
