//! Storefront e-commerce events.
//!
//! Trackers never fail the caller: an event that cannot be sent is queued or
//! dropped, and the reason logged at debug.

use storefront_klaviyo_core::{Cart, Order, Product};

use super::{Klaviyo, TrackEvent};
use crate::cache::CacheStorage;
use crate::error::Result;
use crate::mappers;

/// Product page viewed.
pub const VIEWED_PRODUCT: &str = "Viewed Product";
/// Line added to the cart.
pub const ADDED_TO_CART_PRODUCT: &str = "Added to Cart Product";
/// Line removed from the cart.
pub const REMOVED_FROM_CART_PRODUCT: &str = "Removed from Cart Product";
/// Checkout opened with the current cart.
pub const STARTED_CHECKOUT: &str = "Started Checkout";
/// Order submitted.
pub const PLACED_ORDER: &str = "Placed Order";
/// One line of a placed order.
pub const ORDERED_PRODUCT: &str = "Ordered Product";

impl<S: CacheStorage> Klaviyo<S> {
    /// Track `Viewed Product`.
    pub async fn product_viewed(&self, product: &Product) {
        self.track_quietly(VIEWED_PRODUCT, mappers::map_product(product))
            .await;
    }

    /// Track `Added to Cart Product` for the added line.
    pub async fn product_added_to_cart(&self, product: &Product) {
        self.track_quietly(ADDED_TO_CART_PRODUCT, mappers::map_line_item(product))
            .await;
    }

    /// Track `Removed from Cart Product` for the removed line.
    pub async fn product_removed_from_cart(&self, product: &Product) {
        self.track_quietly(REMOVED_FROM_CART_PRODUCT, mappers::map_line_item(product))
            .await;
    }

    /// Track `Started Checkout` with the whole cart.
    pub async fn checkout_started(&self, cart: &Cart) {
        self.track_quietly(STARTED_CHECKOUT, mappers::map_cart(cart))
            .await;
    }

    /// Track `Placed Order`, then `Ordered Product` for each line once the
    /// order itself went through.
    pub async fn order_placed(&self, order: &Order) {
        let placed = self
            .track(TrackEvent::new(PLACED_ORDER, mappers::map_order(order)))
            .await;
        if log_failure(PLACED_ORDER, placed) {
            for product in &order.products {
                self.product_ordered(order, product).await;
            }
        }
    }

    /// Track `Ordered Product` for one line of `order`.
    pub async fn product_ordered(&self, order: &Order, product: &Product) {
        self.track_quietly(ORDERED_PRODUCT, mappers::map_ordered_product(order, product))
            .await;
    }

    async fn track_quietly(&self, event: &str, data: serde_json::Value) {
        let result = self.track(TrackEvent::new(event, data)).await;
        log_failure(event, result);
    }
}

/// `true` when the event was sent.
fn log_failure(event: &str, result: Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(event, error = %e, "Event not sent");
            false
        }
    }
}
