//! Per-store Klaviyo account and list lookup.
//!
//! Accounts come from the `KLAVIYO_ACCOUNTS` JSON object, keyed by store code:
//!
//! ```json
//! {
//!   "default": {
//!     "private_key": "pk_4f9...",
//!     "public_key": "Ab12Cd",
//!     "endpoint": "https://a.klaviyo.com/api",
//!     "lists": { "default": "XyZ123", "sms": "SmS456" }
//!   }
//! }
//! ```
//!
//! The first declared account answers requests that carry no store code.

use std::collections::HashMap;

use secrecy::SecretString;
use serde::Deserialize;
use storefront_klaviyo_core::{ListKey, StoreCode};
use thiserror::Error;

/// Errors resolving a store code or list key against configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    /// No account is configured for the requested store.
    #[error("No Klaviyo account configured for store '{0}'")]
    UnknownStore(StoreCode),

    /// Neither the requested list nor the default list is mapped.
    #[error("No Klaviyo list '{list}' or default list configured for store '{store}'")]
    ListNotConfigured { store: StoreCode, list: ListKey },
}

/// Klaviyo account used for one store.
///
/// Implements `Debug` manually to redact the private key.
#[derive(Clone)]
pub struct AccountConfig {
    /// Endpoint override for this account; the global endpoint applies when unset.
    pub endpoint: Option<String>,
    /// Private API key sent as the `api-key` header.
    pub private_key: SecretString,
    /// Public site ID (safe to expose in browser).
    pub public_key: Option<String>,
    /// List key to Klaviyo list ID.
    pub lists: HashMap<ListKey, String>,
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("endpoint", &self.endpoint)
            .field("private_key", &"[REDACTED]")
            .field("public_key", &self.public_key)
            .field("lists", &self.lists)
            .finish()
    }
}

impl AccountConfig {
    /// Resolve a list key to a Klaviyo list ID.
    ///
    /// A missing key means [`ListKey::DEFAULT`]; an unmapped key falls back to
    /// the default list.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::ListNotConfigured` when the default list is also unmapped.
    pub fn list_id(&self, store: &StoreCode, list: Option<&ListKey>) -> Result<&str, AccountError> {
        let requested = list.cloned().unwrap_or_default();

        self.lists
            .get(&requested)
            .or_else(|| self.lists.get(&ListKey::default()))
            .map(String::as_str)
            .ok_or_else(|| AccountError::ListNotConfigured {
                store: store.clone(),
                list: requested,
            })
    }
}

/// Wire shape of one entry in `KLAVIYO_ACCOUNTS`.
#[derive(Deserialize)]
struct RawAccount {
    #[serde(default)]
    endpoint: Option<String>,
    private_key: String,
    #[serde(default)]
    public_key: Option<String>,
    #[serde(default)]
    lists: HashMap<String, String>,
}

/// All configured accounts in declaration order.
#[derive(Debug, Clone)]
pub struct Accounts {
    entries: Vec<(StoreCode, AccountConfig)>,
}

impl Accounts {
    /// Build from `(store code, account)` pairs; the first pair is the default.
    #[must_use]
    pub const fn new(entries: Vec<(StoreCode, AccountConfig)>) -> Self {
        Self { entries }
    }

    /// Parse the `KLAVIYO_ACCOUNTS` JSON object, keeping declaration order.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the value is not an object of accounts.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)?;

        let entries = object
            .into_iter()
            .map(|(store, value)| {
                let account: RawAccount = serde_json::from_value(value)?;
                Ok((
                    StoreCode::new(store),
                    AccountConfig {
                        endpoint: account
                            .endpoint
                            .map(|e| e.trim_end_matches('/').to_string()),
                        private_key: SecretString::from(account.private_key),
                        public_key: account.public_key,
                        lists: account
                            .lists
                            .into_iter()
                            .map(|(key, id)| (ListKey::new(key), id))
                            .collect(),
                    },
                ))
            })
            .collect::<Result<Vec<_>, serde_json::Error>>()?;

        Ok(Self { entries })
    }

    /// Number of configured accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no account is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate accounts in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&StoreCode, &AccountConfig)> {
        self.entries.iter().map(|(code, account)| (code, account))
    }

    /// Resolve the account for a store code, or the first account when none is given.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::UnknownStore` for an unconfigured store code, or
    /// when no accounts exist at all.
    pub fn resolve(
        &self,
        store: Option<&StoreCode>,
    ) -> Result<(&StoreCode, &AccountConfig), AccountError> {
        match store {
            Some(code) => self
                .iter()
                .find(|(candidate, _)| *candidate == code)
                .ok_or_else(|| AccountError::UnknownStore(code.clone())),
            None => self
                .iter()
                .next()
                .ok_or_else(|| AccountError::UnknownStore(StoreCode::new("default"))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    const ACCOUNTS: &str = r#"{
        "us": {
            "private_key": "pk_us_9f8e7d6c5b4a",
            "lists": { "default": "US_DEFAULT", "sms": "US_SMS" }
        },
        "de": {
            "private_key": "pk_de_1a2b3c4d5e6f",
            "public_key": "DePub",
            "endpoint": "https://eu.klaviyo.test/api/",
            "lists": { "vip": "DE_VIP" }
        }
    }"#;

    #[test]
    fn test_from_json_keeps_declaration_order() {
        let accounts = Accounts::from_json(ACCOUNTS).unwrap();
        let codes: Vec<&str> = accounts.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(codes, vec!["us", "de"]);
    }

    #[test]
    fn test_from_json_trims_endpoint() {
        let accounts = Accounts::from_json(ACCOUNTS).unwrap();
        let (_, de) = accounts.resolve(Some(&StoreCode::new("de"))).unwrap();
        assert_eq!(de.endpoint.as_deref(), Some("https://eu.klaviyo.test/api"));
        assert_eq!(de.private_key.expose_secret(), "pk_de_1a2b3c4d5e6f");
    }

    #[test]
    fn test_resolve_defaults_to_first_account() {
        let accounts = Accounts::from_json(ACCOUNTS).unwrap();
        let (code, _) = accounts.resolve(None).unwrap();
        assert_eq!(code.as_str(), "us");
    }

    #[test]
    fn test_resolve_unknown_store() {
        let accounts = Accounts::from_json(ACCOUNTS).unwrap();
        assert_eq!(
            accounts.resolve(Some(&StoreCode::new("jp"))).unwrap_err(),
            AccountError::UnknownStore(StoreCode::new("jp"))
        );
    }

    #[test]
    fn test_list_id_fallbacks() {
        let accounts = Accounts::from_json(ACCOUNTS).unwrap();
        let (us_code, us) = accounts.resolve(None).unwrap();

        assert_eq!(us.list_id(us_code, None).unwrap(), "US_DEFAULT");
        assert_eq!(us.list_id(us_code, Some(&ListKey::new("sms"))).unwrap(), "US_SMS");
        assert_eq!(
            us.list_id(us_code, Some(&ListKey::new("unknown"))).unwrap(),
            "US_DEFAULT"
        );

        let (de_code, de) = accounts.resolve(Some(&StoreCode::new("de"))).unwrap();
        assert_eq!(de.list_id(de_code, Some(&ListKey::new("vip"))).unwrap(), "DE_VIP");
        assert!(matches!(
            de.list_id(de_code, None),
            Err(AccountError::ListNotConfigured { .. })
        ));
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let accounts = Accounts::from_json(ACCOUNTS).unwrap();
        let debug_output = format!("{accounts:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("pk_us_9f8e7d6c5b4a"));
    }

    #[test]
    fn test_from_json_rejects_missing_key() {
        assert!(Accounts::from_json(r#"{"us": {"lists": {}}}"#).is_err());
        assert!(Accounts::from_json("[]").is_err());
    }
}
