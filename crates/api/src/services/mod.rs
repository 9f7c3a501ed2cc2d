//! Outbound services for the subscription router.
//!
//! # Services
//!
//! - `klaviyo` - Klaviyo list API forwarding

pub mod klaviyo;

pub use klaviyo::{EmailsPayload, KlaviyoError, ListClient, ListTarget, ProfilesPayload, Relay};
