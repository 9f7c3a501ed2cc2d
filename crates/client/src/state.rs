//! In-memory dispatcher state.

use storefront_klaviyo_core::User;

use crate::customer::Customer;

/// Last-known state of the current visitor.
///
/// Mirrors server state; nothing here is authoritative.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KlaviyoState {
    /// Identified customer, `None` until identify succeeds.
    pub customer: Option<Customer>,
    /// Newsletter subscription, `None` until looked up or changed.
    pub is_subscribed: Option<bool>,
    /// Back-in-stock watch keys, insertion order.
    pub back_in_stock_watching: Vec<String>,
    /// Storefront account currently logged in, if any.
    pub session_user: Option<User>,
}

impl KlaviyoState {
    /// Whether a watch key is present.
    #[must_use]
    pub fn is_watching(&self, key: &str) -> bool {
        self.back_in_stock_watching.iter().any(|k| k == key)
    }

    /// Add a watch key once.
    pub fn watch(&mut self, key: String) {
        if !self.is_watching(&key) {
            self.back_in_stock_watching.push(key);
        }
    }

    /// Drop a watch key.
    pub fn unwatch(&mut self, key: &str) {
        self.back_in_stock_watching.retain(|k| k != key);
    }

    /// Forget the visitor; the storefront session is left alone.
    pub fn reset_customer(&mut self) {
        self.customer = None;
        self.is_subscribed = None;
        self.back_in_stock_watching.clear();
    }

    /// Whether the storefront session has a logged-in user with an email.
    #[must_use]
    pub fn has_session_email(&self) -> bool {
        self.session_user
            .as_ref()
            .is_some_and(|user| !user.email.is_empty())
    }
}
