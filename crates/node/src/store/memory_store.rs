//! In-memory customer store.

use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use customer_vault_core::{CustomerKey, ReferralRecord, Wishlist};
use tracing::debug;

use super::{CustomerStore, StoreError};

#[derive(Debug, Default)]
struct CustomerRecord {
    profile: Option<Bytes>,
    wishlist: Option<Wishlist>,
    referrals: Option<ReferralRecord>,
}

/// In-memory customer store backed by a `RwLock<HashMap>`.
///
/// Observable behavior matches [`super::FileStore`]: full overwrites,
/// `None` for never-written artifacts, and a customer is listed once any
/// artifact has been written for it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    customers: RwLock<HashMap<CustomerKey, CustomerRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn update(&self, key: &CustomerKey, apply: impl FnOnce(&mut CustomerRecord)) {
        let mut map = self
            .customers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        apply(map.entry(key.clone()).or_default());
    }

    fn read<T>(&self, key: &CustomerKey, select: impl FnOnce(&CustomerRecord) -> Option<T>) -> Option<T> {
        let map = self
            .customers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        map.get(key).and_then(select)
    }
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn put_profile(&self, key: &CustomerKey, image: Bytes) -> Result<String, StoreError> {
        debug!(%key, size = image.len(), "storing profile in memory");
        self.update(key, |record| record.profile = Some(image));
        Ok(format!("memory://{key}/profile.webp"))
    }

    async fn get_profile(&self, key: &CustomerKey) -> Result<Option<Bytes>, StoreError> {
        Ok(self.read(key, |record| record.profile.clone()))
    }

    async fn put_wishlist(&self, key: &CustomerKey, wishlist: &Wishlist) -> Result<(), StoreError> {
        self.update(key, |record| record.wishlist = Some(wishlist.clone()));
        Ok(())
    }

    async fn get_wishlist(&self, key: &CustomerKey) -> Result<Option<Wishlist>, StoreError> {
        Ok(self.read(key, |record| record.wishlist.clone()))
    }

    async fn put_referrals(
        &self,
        key: &CustomerKey,
        record: &ReferralRecord,
    ) -> Result<(), StoreError> {
        self.update(key, |stored| stored.referrals = Some(record.clone()));
        Ok(())
    }

    async fn get_referrals(&self, key: &CustomerKey) -> Result<Option<ReferralRecord>, StoreError> {
        Ok(self.read(key, |record| record.referrals.clone()))
    }

    async fn list_customers(&self) -> Result<BTreeSet<CustomerKey>, StoreError> {
        let map = self
            .customers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(map.keys().cloned().collect())
    }

    async fn check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
