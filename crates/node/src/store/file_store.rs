//! Filesystem-backed customer store.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use customer_vault_core::{ArtifactKind, CustomerKey, ReferralRecord, Wishlist};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{CustomerStore, StoreError};

/// Customer store rooted at a directory.
///
/// Each artifact lives at `{root}/{key}/{artifact file name}`.
///
/// Writes are atomic: data goes to a uniquely named temporary file in the
/// customer directory first, then is renamed over the target. Readers never
/// see a half-written artifact, and two racing writers each rename a complete
/// file, so the last rename wins.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at the given directory.
    ///
    /// The directory is created if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the root cannot be created.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The store root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn customer_dir(&self, key: &CustomerKey) -> PathBuf {
        self.root.join(key.as_str())
    }

    fn artifact_path(&self, key: &CustomerKey, kind: ArtifactKind) -> PathBuf {
        self.customer_dir(key).join(kind.file_name())
    }

    async fn write_artifact(
        &self,
        key: &CustomerKey,
        kind: ArtifactKind,
        data: &[u8],
    ) -> Result<PathBuf, StoreError> {
        let dir = self.customer_dir(key);
        // Idempotent; the directory may outlive a failed write below.
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(kind.file_name());
        let tmp_path = dir.join(format!(".{}.{}.tmp", kind.file_name(), Uuid::new_v4().simple()));

        if let Err(e) = tokio::fs::write(&tmp_path, data).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        debug!(%key, %kind, path = %path.display(), size = data.len(), "stored artifact");
        Ok(path)
    }

    async fn read_artifact(
        &self,
        key: &CustomerKey,
        kind: ArtifactKind,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        match tokio::fs::read(self.artifact_path(key, kind)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn write_json<T: Serialize + Sync>(
        &self,
        key: &CustomerKey,
        kind: ArtifactKind,
        value: &T,
    ) -> Result<(), StoreError> {
        let data = serde_json::to_vec(value)?;
        self.write_artifact(key, kind, &data).await?;
        Ok(())
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        key: &CustomerKey,
        kind: ArtifactKind,
    ) -> Result<Option<T>, StoreError> {
        let Some(data) = self.read_artifact(key, kind).await? else {
            return Ok(None);
        };
        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                key: key.clone(),
                kind,
                source,
            })
    }
}

#[async_trait]
impl CustomerStore for FileStore {
    async fn put_profile(&self, key: &CustomerKey, image: Bytes) -> Result<String, StoreError> {
        let path = self.write_artifact(key, ArtifactKind::Profile, &image).await?;
        Ok(path.display().to_string())
    }

    async fn get_profile(&self, key: &CustomerKey) -> Result<Option<Bytes>, StoreError> {
        Ok(self
            .read_artifact(key, ArtifactKind::Profile)
            .await?
            .map(Bytes::from))
    }

    async fn put_wishlist(&self, key: &CustomerKey, wishlist: &Wishlist) -> Result<(), StoreError> {
        self.write_json(key, ArtifactKind::Wishlist, wishlist).await
    }

    async fn get_wishlist(&self, key: &CustomerKey) -> Result<Option<Wishlist>, StoreError> {
        self.read_json(key, ArtifactKind::Wishlist).await
    }

    async fn put_referrals(
        &self,
        key: &CustomerKey,
        record: &ReferralRecord,
    ) -> Result<(), StoreError> {
        self.write_json(key, ArtifactKind::Referrals, record).await
    }

    async fn get_referrals(&self, key: &CustomerKey) -> Result<Option<ReferralRecord>, StoreError> {
        self.read_json(key, ArtifactKind::Referrals).await
    }

    async fn list_customers(&self) -> Result<BTreeSet<CustomerKey>, StoreError> {
        let mut keys = BTreeSet::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                warn!(path = %entry.path().display(), "skipping non-UTF-8 directory in store root");
                continue;
            };
            let key = CustomerKey::normalize(Some(name));
            if key.as_str() != name {
                warn!(name, "skipping directory that is not a normalized customer key");
                continue;
            }
            keys.insert(key);
        }

        Ok(keys)
    }

    async fn check(&self) -> Result<(), StoreError> {
        let metadata = tokio::fs::metadata(&self.root).await?;
        if metadata.is_dir() {
            Ok(())
        } else {
            Err(StoreError::Io(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{} is not a directory", self.root.display()),
            )))
        }
    }
}
