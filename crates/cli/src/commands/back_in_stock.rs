//! Back-in-stock commands.
//!
//! # Usage
//!
//! ```bash
//! klaviyo-cli back-in-stock subscribe -e jo@example.com --id 42 --sku SER-30 --parent-sku SER
//! klaviyo-cli back-in-stock unsubscribe -e jo@example.com --id 42 --sku SER-30 --parent-sku SER
//! ```

use storefront_klaviyo_client::{BackInStockRequest, FileCache, Klaviyo};

use super::CommandError;

pub async fn subscribe(
    klaviyo: &Klaviyo<FileCache>,
    request: &BackInStockRequest,
) -> Result<(), CommandError> {
    match klaviyo.back_in_stock_subscribe(request).await? {
        Some(_) => tracing::info!("Watching {}", request.product.watch_key()),
        None => tracing::info!("Already watching {}", request.product.watch_key()),
    }
    Ok(())
}

pub async fn unsubscribe(
    klaviyo: &Klaviyo<FileCache>,
    request: &BackInStockRequest,
) -> Result<(), CommandError> {
    match klaviyo.back_in_stock_unsubscribe(request).await? {
        Some(_) => tracing::info!("Stopped watching {}", request.product.watch_key()),
        None => tracing::info!("Not watching {}", request.product.watch_key()),
    }
    Ok(())
}
