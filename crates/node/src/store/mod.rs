//! Customer record storage.
//!
//! # Layout
//!
//! One directory per [`CustomerKey`] directly under the store root, holding at
//! most one file per [`ArtifactKind`]:
//!
//! ```text
//! <root>/
//!   Alice_Smith/
//!     profile.webp
//!     wishlist.json
//!     referrals.json
//!   guest_profile/
//!     wishlist.json
//! ```
//!
//! Every `put` is a full overwrite. There is no per-key lock, so concurrent
//! writers to the same artifact resolve as last-write-wins.
//!
//! Handlers only see the [`CustomerStore`] trait; [`FileStore`] is the
//! production backend and [`MemoryStore`] backs tests.

mod file_store;
mod memory_store;

use std::collections::BTreeSet;

use async_trait::async_trait;
use bytes::Bytes;
use customer_vault_core::{ArtifactKind, CustomerKey, ReferralRecord, Wishlist};

pub use file_store::FileStore;
pub use memory_store::MemoryStore;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A payload could not be serialized for writing.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A stored JSON artifact no longer parses as its expected shape.
    #[error("corrupt {kind} artifact for {key}: {source}")]
    Corrupt {
        /// Customer the artifact belongs to.
        key: CustomerKey,
        /// Which artifact failed to parse.
        kind: ArtifactKind,
        /// Underlying parse error.
        source: serde_json::Error,
    },
}

/// Per-customer artifact storage.
///
/// All implementations must be `Send + Sync` for use across handlers.
/// `get_*` returns `Ok(None)` when the artifact was never written; callers
/// decide whether that is a default or a not-found.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Store a canonical profile image. Returns where it was written.
    async fn put_profile(&self, key: &CustomerKey, image: Bytes) -> Result<String, StoreError>;

    /// Retrieve the profile image.
    async fn get_profile(&self, key: &CustomerKey) -> Result<Option<Bytes>, StoreError>;

    /// Replace the wishlist.
    async fn put_wishlist(&self, key: &CustomerKey, wishlist: &Wishlist) -> Result<(), StoreError>;

    /// Retrieve the wishlist.
    async fn get_wishlist(&self, key: &CustomerKey) -> Result<Option<Wishlist>, StoreError>;

    /// Replace the referral record.
    async fn put_referrals(
        &self,
        key: &CustomerKey,
        record: &ReferralRecord,
    ) -> Result<(), StoreError>;

    /// Retrieve the referral record.
    async fn get_referrals(&self, key: &CustomerKey) -> Result<Option<ReferralRecord>, StoreError>;

    /// Every customer that has had any artifact written.
    async fn list_customers(&self) -> Result<BTreeSet<CustomerKey>, StoreError>;

    /// Check that the backend is usable (for readiness probes).
    async fn check(&self) -> Result<(), StoreError>;
}
