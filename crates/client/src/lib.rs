//! Storefront Klaviyo Client - per-visitor action dispatcher.
//!
//! Identifies the visitor to Klaviyo, tracks e-commerce events, manages
//! newsletter membership through the subscription router, and handles
//! back-in-stock watches. Last-known state is mirrored into a pluggable
//! cache so it survives restarts.
//!
//! # Modules
//!
//! - [`dispatcher`] - The [`Klaviyo`] dispatcher and its actions
//! - [`mappers`] - Storefront models to Klaviyo property objects
//! - [`form`] - Validated newsletter signup form
//! - [`cache`] - Cache trait with in-memory and file backends
//! - [`config`] - Environment configuration
//! - [`state`] - In-memory visitor state
//! - [`customer`] - Klaviyo customer properties
//! - [`error`] - Error types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod customer;
pub mod dispatcher;
pub mod error;
pub mod form;
pub mod mappers;
pub mod state;

pub use cache::{CacheError, CacheStorage, FileCache, MemoryCache};
pub use config::{ClientConfig, ConfigError};
pub use customer::{Customer, CustomerDetails};
pub use dispatcher::{AdvancedSubscription, BackInStockRequest, Klaviyo, TrackEvent};
pub use error::KlaviyoError;
pub use form::{FormError, SubscribeForm};
pub use state::KlaviyoState;
