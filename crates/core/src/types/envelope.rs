//! Response envelope shared by the subscription router and its callers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of every subscription router response.
///
/// `code` always equals the HTTP status of the response carrying it; `result`
/// is the upstream body on relay, or a message on local failure.
///
/// ```
/// use storefront_klaviyo_core::ApiStatus;
///
/// let status = ApiStatus::new(422, "Email must be provided.");
/// assert!(!status.is_success());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiStatus {
    pub code: u16,
    pub result: Value,
}

impl ApiStatus {
    /// Build an envelope from a status code and any JSON-convertible result.
    pub fn new(code: u16, result: impl Into<Value>) -> Self {
        Self {
            code,
            result: result.into(),
        }
    }

    /// Whether `code` is a 2xx status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code >= 200 && self.code < 300
    }

    /// Whether `result` is a non-empty array (a list membership lookup hit).
    #[must_use]
    pub fn has_results(&self) -> bool {
        self.result.as_array().is_some_and(|items| !items.is_empty())
    }
}
