//! Identified customer as Klaviyo sees it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use storefront_klaviyo_core::{PersonalDetails, User};

use crate::mappers;

/// Klaviyo customer properties (`$email`, `$first_name`, ...).
///
/// Free-form on purpose: callers may attach any additional identifiers when
/// identifying, and they are sent along with every tracked event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Customer(Map<String, Value>);

impl Customer {
    /// Wrap an existing property map.
    #[must_use]
    pub const fn from_properties(properties: Map<String, Value>) -> Self {
        Self(properties)
    }

    /// The customer's `$email`, if set.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.0.get("$email").and_then(Value::as_str)
    }

    /// Property map.
    #[must_use]
    pub const fn properties(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Set a property, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Merge additional properties; later values win.
    pub fn extend(&mut self, additional: Map<String, Value>) {
        self.0.extend(additional);
    }
}

/// What the storefront knows about the person being identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerDetails {
    /// Logged-in account.
    User(User),
    /// Guest checkout details.
    PersonalDetails(PersonalDetails),
}

impl CustomerDetails {
    /// Map to Klaviyo customer properties.
    #[must_use]
    pub fn to_customer(&self) -> Customer {
        match self {
            Self::User(user) => mappers::map_customer(user),
            Self::PersonalDetails(details) => mappers::map_personal_details(details),
        }
    }
}

impl From<User> for CustomerDetails {
    fn from(user: User) -> Self {
        Self::User(user)
    }
}

impl From<PersonalDetails> for CustomerDetails {
    fn from(details: PersonalDetails) -> Self {
        Self::PersonalDetails(details)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extend_overrides() {
        let mut customer = CustomerDetails::from(User::with_email("jo@example.com")).to_customer();
        customer.extend(
            json!({"$source": "footer", "$email": "jo+alt@example.com"})
                .as_object()
                .unwrap()
                .clone(),
        );

        assert_eq!(customer.email(), Some("jo+alt@example.com"));
        assert_eq!(customer.properties()["$source"], "footer");
    }

    #[test]
    fn test_transparent_serde() {
        let customer: Customer = serde_json::from_value(json!({"$email": "a@b.co"})).unwrap();
        assert_eq!(serde_json::to_value(&customer).unwrap(), json!({"$email": "a@b.co"}));
    }
}
