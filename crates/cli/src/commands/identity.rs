//! Identify and track commands.
//!
//! # Usage
//!
//! ```bash
//! klaviyo-cli identify -e jo@example.com --first-name Jo -p source=cli
//! klaviyo-cli track "Viewed Product" --data '{"SKU": "SOAP"}'
//! ```

use serde_json::{Map, Value};
use storefront_klaviyo_client::{FileCache, Klaviyo, TrackEvent};
use storefront_klaviyo_core::User;

use super::CommandError;

/// Identify a customer, replaying any events queued before.
pub async fn identify(
    klaviyo: &Klaviyo<FileCache>,
    user: User,
    properties: &[String],
) -> Result<(), CommandError> {
    let additional = parse_properties(properties)?;
    let customer = klaviyo.identify(user.into(), true, additional).await?;

    tracing::info!(
        "Identified {}",
        customer.email().unwrap_or("customer without email")
    );
    Ok(())
}

/// Track an event; it is queued when nobody is identified yet.
pub async fn track(
    klaviyo: &Klaviyo<FileCache>,
    event: &str,
    data: Option<&str>,
) -> Result<(), CommandError> {
    let data = match data {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| CommandError::InvalidArgument("--data", e.to_string()))?,
        None => Value::Object(Map::new()),
    };

    match klaviyo.track(TrackEvent::new(event, data)).await {
        Ok(()) => {
            tracing::info!("Tracked {event}");
            Ok(())
        }
        Err(e) if e.is_queued() => {
            tracing::info!("Queued {event}: {e}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// `key=value` pairs; values parse as JSON when they can, else stay strings.
fn parse_properties(pairs: &[String]) -> Result<Map<String, Value>, CommandError> {
    pairs
        .iter()
        .map(|pair| {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| CommandError::InvalidArgument("--property", pair.clone()))?;
            let value = serde_json::from_str(value).unwrap_or_else(|_| Value::from(value));
            Ok::<_, CommandError>((key.to_string(), value))
        })
        .collect()
}
