//! Newsletter signup form binding.
//!
//! Holds what the visitor typed and only dispatches once the email validates.

use storefront_klaviyo_core::{ApiStatus, Email, EmailError};
use thiserror::Error;

use crate::cache::CacheStorage;
use crate::dispatcher::{AdvancedSubscription, Klaviyo};
use crate::error::KlaviyoError;

/// Why a form submission did not go through.
#[derive(Debug, Error)]
pub enum FormError {
    /// Email is missing or malformed; nothing was sent.
    #[error("Invalid email: {0}")]
    Invalid(#[from] EmailError),

    /// The subscription request failed.
    #[error(transparent)]
    Dispatch(#[from] KlaviyoError),
}

/// Signup form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscribeForm {
    pub email: String,
    pub phone_number: Option<String>,
}

impl SubscribeForm {
    /// Form with only an email filled in.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            phone_number: None,
        }
    }

    /// Validate the email field (required, well-formed).
    ///
    /// # Errors
    ///
    /// Returns the reason the email was rejected.
    pub fn validate(&self) -> Result<Email, EmailError> {
        Email::parse(&self.email)
    }

    /// Whether submitting would be refused.
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        self.validate().is_err()
    }

    /// Subscribe the email to the store's default list.
    ///
    /// # Errors
    ///
    /// `Invalid` without any request when the email does not validate,
    /// `Dispatch` when the request fails.
    pub async fn subscribe<S: CacheStorage>(
        &self,
        klaviyo: &Klaviyo<S>,
    ) -> Result<Option<ApiStatus>, FormError> {
        let email = self.validate()?;
        Ok(klaviyo.subscribe(email.as_str()).await?)
    }

    /// Subscribe the email, with SMS consent when a phone number was given.
    ///
    /// # Errors
    ///
    /// `Invalid` without any request when the email does not validate,
    /// `Dispatch` when the request fails.
    pub async fn subscribe_advanced<S: CacheStorage>(
        &self,
        klaviyo: &Klaviyo<S>,
    ) -> Result<ApiStatus, FormError> {
        let email = self.validate()?;
        let subscription = AdvancedSubscription {
            email: Some(email.into_inner()),
            phone_number: self
                .phone_number
                .clone()
                .filter(|phone| !phone.trim().is_empty()),
            ..AdvancedSubscription::default()
        };
        Ok(klaviyo.subscribe_advanced(&subscription).await?)
    }
}
