//! Storefront Klaviyo subscription router library.
//!
//! This crate provides the router as a library, allowing it to be tested
//! and embedded.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod accounts;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
