//! List subscription payload items.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One profile in a list subscribe request.
///
/// Known fields are typed; anything else the caller sends (custom profile
/// properties) is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sms_consent: Option<bool>,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl Profile {
    /// Profile carrying only an email.
    #[must_use]
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Self::default()
        }
    }

    /// Profile subscribing an email and a phone number with SMS consent.
    #[must_use]
    pub fn with_sms(email: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            phone_number: Some(phone_number.into()),
            sms_consent: Some(true),
            properties: Map::new(),
        }
    }

    /// Whether the profile has a non-blank email.
    #[must_use]
    pub fn has_email(&self) -> bool {
        self.email.as_deref().is_some_and(|email| !email.trim().is_empty())
    }
}
