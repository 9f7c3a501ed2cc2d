//! Newtype keys for configuration lookups.
//!
//! Use the `define_key!` macro to create string-backed key wrappers so a store
//! code can never be passed where a list key is expected.

/// Macro to define a type-safe string key wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - `new()`, `as_str()`, `Display`, `From<&str>` and `From<String>`
///
/// # Example
///
/// ```rust
/// # use storefront_klaviyo_core::define_key;
/// define_key!(RegionCode);
///
/// let region = RegionCode::new("eu");
/// assert_eq!(region.as_str(), "eu");
/// ```
#[macro_export]
macro_rules! define_key {
    ($name:ident) => {
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new key from any string-like value.
            #[must_use]
            pub fn new(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            /// Get the underlying key.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                Self(key.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(key: String) -> Self {
                Self(key)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_key!(StoreCode);
define_key!(ListKey);

impl ListKey {
    /// Key of the list used when no key is given or the key is unmapped.
    pub const DEFAULT: &'static str = "default";
}

impl Default for ListKey {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}
