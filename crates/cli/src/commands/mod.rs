//! Command implementations.
//!
//! Every command runs against a [`Klaviyo`] dispatcher backed by a
//! [`FileCache`], so the identified customer, queued events and watch list
//! carry over between invocations.

pub mod back_in_stock;
pub mod identity;
pub mod newsletter;

use std::path::Path;

use storefront_klaviyo_client::{
    ClientConfig, ConfigError, FileCache, FormError, Klaviyo, KlaviyoError,
};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Klaviyo(#[from] KlaviyoError),

    #[error(transparent)]
    Form(#[from] FormError),

    /// `--data` or `--property` could not be parsed.
    #[error("Invalid argument {0}: {1}")]
    InvalidArgument(&'static str, String),
}

/// Build the dispatcher and restore what a previous run left in the cache.
pub async fn dispatcher(cache_dir: &Path) -> Result<Klaviyo<FileCache>, CommandError> {
    let config = ClientConfig::from_env()?;
    let klaviyo = Klaviyo::new(config, FileCache::new(cache_dir))?;

    klaviyo.load_customer_from_cache().await?;
    match klaviyo.load_watching_list(true).await {
        Ok(_) | Err(KlaviyoError::NotImplemented(_)) => {}
        Err(e) => return Err(e.into()),
    }

    Ok(klaviyo)
}

/// Forget the cached customer and watch list.
pub async fn reset(klaviyo: &Klaviyo<FileCache>) {
    klaviyo.reset_customer(true).await;
    tracing::info!("Customer state cleared");
}
