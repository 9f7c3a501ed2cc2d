//! Newsletter commands.
//!
//! # Usage
//!
//! ```bash
//! klaviyo-cli status jo@example.com
//! klaviyo-cli subscribe jo@example.com
//! klaviyo-cli subscribe-advanced jo@example.com --phone +15555550100
//! klaviyo-cli unsubscribe jo@example.com
//! ```

use storefront_klaviyo_client::{FileCache, Klaviyo, SubscribeForm};

use super::CommandError;

pub async fn status(klaviyo: &Klaviyo<FileCache>, email: &str) -> Result<(), CommandError> {
    let subscribed = klaviyo.status(email).await?;
    tracing::info!(
        "{email} is {}subscribed",
        if subscribed { "" } else { "not " }
    );
    Ok(())
}

pub async fn subscribe(klaviyo: &Klaviyo<FileCache>, email: String) -> Result<(), CommandError> {
    match SubscribeForm::new(email).subscribe(klaviyo).await? {
        Some(envelope) => tracing::info!("Subscribed ({})", envelope.code),
        None => tracing::info!("Already subscribed"),
    }
    Ok(())
}

pub async fn subscribe_advanced(
    klaviyo: &Klaviyo<FileCache>,
    email: String,
    phone_number: Option<String>,
) -> Result<(), CommandError> {
    let form = SubscribeForm {
        email,
        phone_number,
    };
    let envelope = form.subscribe_advanced(klaviyo).await?;
    tracing::info!("Subscribed ({}): {}", envelope.code, envelope.result);
    Ok(())
}

/// Membership is not cached between runs, so it is looked up first.
pub async fn unsubscribe(klaviyo: &Klaviyo<FileCache>, email: &str) -> Result<(), CommandError> {
    klaviyo.status(email).await?;
    match klaviyo.unsubscribe(email).await? {
        Some(envelope) => tracing::info!("Unsubscribed ({})", envelope.code),
        None => tracing::info!("{email} is not subscribed"),
    }
    Ok(())
}
