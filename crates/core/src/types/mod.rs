//! Core types for Customer Vault.
//!
//! This module provides type-safe wrappers for the per-customer domain concepts.

pub mod artifact;
pub mod customer_key;

pub use artifact::{ArtifactKind, ReferralRecord, ShapeError, Wishlist};
pub use customer_key::{CustomerKey, GUEST_KEY};
