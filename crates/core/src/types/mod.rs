//! Core types for the storefront Klaviyo bridge.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod envelope;
pub mod key;
pub mod profile;
pub mod storefront;

pub use email::{Email, EmailError};
pub use envelope::ApiStatus;
pub use key::*;
pub use profile::Profile;
pub use storefront::*;
