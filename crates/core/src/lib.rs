//! Storefront Klaviyo Core - Shared types library.
//!
//! This crate provides common types used across all bridge components:
//! - `api` - Subscription router forwarding to Klaviyo's list API
//! - `client` - Customer identity, event tracking and subscription dispatcher
//! - `cli` - Command-line front end over the dispatcher
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Both the
//! router and the dispatcher speak in these types, so the request and response
//! shapes they exchange are defined exactly once.
//!
//! # Modules
//!
//! - [`types`] - Emails, store and list keys, storefront models, the response envelope

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
