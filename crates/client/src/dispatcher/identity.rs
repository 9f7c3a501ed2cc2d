//! Customer identification and event tracking.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Klaviyo;
use crate::cache::{CUSTOMER_KEY, CacheStorage, TRACK_QUEUE_KEY, WATCHING_KEY};
use crate::customer::{Customer, CustomerDetails};
use crate::error::{KlaviyoError, Result};

/// A tracked event, as queued and as replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackEvent {
    /// Klaviyo metric name, e.g. `Viewed Product`.
    pub event: String,
    /// Event properties.
    pub data: Value,
    /// Unix timestamp in seconds.
    pub time: i64,
}

impl TrackEvent {
    /// Event happening now.
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
            time: Utc::now().timestamp(),
        }
    }
}

#[derive(Serialize)]
struct IdentifyPayload<'a> {
    token: &'a str,
    properties: &'a Customer,
}

#[derive(Serialize)]
struct TrackPayload<'a> {
    token: &'a str,
    event: &'a str,
    customer_properties: &'a Customer,
    properties: &'a Value,
    time: i64,
}

impl<S: CacheStorage> Klaviyo<S> {
    /// Identify only when no customer is known yet.
    ///
    /// # Errors
    ///
    /// Same as [`Klaviyo::identify`].
    pub async fn maybe_identify(&self, details: CustomerDetails, use_cache: bool) -> Result<Customer> {
        if let Some(customer) = self.customer().await {
            return Ok(customer);
        }
        self.identify(details, use_cache, Map::new()).await
    }

    /// Tell Klaviyo who the visitor is, then replay queued events.
    ///
    /// `additional_data` is merged over the mapped customer properties.
    ///
    /// # Errors
    ///
    /// Returns error if the identify request fails. Replayed events never fail
    /// the call.
    pub async fn identify(
        &self,
        details: CustomerDetails,
        use_cache: bool,
        additional_data: Map<String, Value>,
    ) -> Result<Customer> {
        let mut customer = details.to_customer();
        customer.extend(additional_data);

        let payload = IdentifyPayload {
            token: &self.inner.config.public_key,
            properties: &customer,
        };
        self.send_encoded("identify", &payload).await?;

        tracing::debug!(email = ?customer.email(), "Customer identified");
        self.inner.state.write().await.customer = Some(customer.clone());
        if use_cache {
            self.cache_quietly(CUSTOMER_KEY, &customer).await;
        }

        self.flush_track_queue().await;

        Ok(customer)
    }

    /// Restore the customer saved by a previous identify.
    ///
    /// # Errors
    ///
    /// Returns error if the cache cannot be read.
    pub async fn load_customer_from_cache(&self) -> Result<Option<Customer>> {
        let customer: Option<Customer> = self.cached(CUSTOMER_KEY).await?;
        if let Some(customer) = &customer {
            self.inner.state.write().await.customer = Some(customer.clone());
        }
        Ok(customer)
    }

    /// Forget the visitor: customer, subscription flag and watch list.
    pub async fn reset_customer(&self, use_cache: bool) {
        self.inner.state.write().await.reset_customer();
        if use_cache {
            self.uncache_quietly(CUSTOMER_KEY).await;
            self.uncache_quietly(WATCHING_KEY).await;
        }
    }

    /// Send an event for the identified customer.
    ///
    /// # Errors
    ///
    /// Returns `NotIdentified` or `Offline` after queueing the event when it
    /// cannot be sent yet, or the request error.
    pub async fn track(&self, event: TrackEvent) -> Result<()> {
        let Some(customer) = self.customer().await else {
            tracing::warn!(event = %event.event, "No customer identified, queueing event");
            self.enqueue(event).await;
            return Err(KlaviyoError::NotIdentified);
        };

        if !self.is_online() {
            tracing::debug!(event = %event.event, "Offline, queueing event");
            self.enqueue(event).await;
            return Err(KlaviyoError::Offline);
        }

        let payload = TrackPayload {
            token: &self.inner.config.public_key,
            event: &event.event,
            customer_properties: &customer,
            properties: &event.data,
            time: event.time,
        };
        self.send_encoded("track", &payload).await
    }

    async fn enqueue(&self, event: TrackEvent) {
        let _guard = self.inner.queue.lock().await;
        let mut queue: Vec<TrackEvent> = match self.cached(TRACK_QUEUE_KEY).await {
            Ok(queue) => queue.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable track queue, starting a new one");
                Vec::new()
            }
        };
        queue.push(event);
        self.cache_quietly(TRACK_QUEUE_KEY, &queue).await;
    }

    /// Drain the queue, replaying each event in order.
    async fn flush_track_queue(&self) {
        let queue = {
            let _guard = self.inner.queue.lock().await;
            let queue: Vec<TrackEvent> = match self.cached(TRACK_QUEUE_KEY).await {
                Ok(Some(queue)) => queue,
                Ok(None) => return,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read track queue");
                    return;
                }
            };
            self.uncache_quietly(TRACK_QUEUE_KEY).await;
            queue
        };

        tracing::debug!(count = queue.len(), "Replaying queued events");
        for event in queue {
            if let Err(e) = self.track(event).await {
                tracing::debug!(error = %e, "Queued event replay failed");
            }
        }
    }
}
