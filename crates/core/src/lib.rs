//! Customer Vault Core - Shared types library.
//!
//! This crate provides the types shared by every Customer Vault component:
//! - `node` - The HTTP node (cloud or local role) that owns the customer store
//! - `integration-tests` - End-to-end tests pairing two nodes
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no filesystem access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Customer keys and the shape-checked wishlist/referral payloads

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
