//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::NodeConfig;
use crate::peer::{self, FetchBroker, PeerError, SyncClient};
use crate::store::{CustomerStore, FileStore, StoreError};

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("peer client error: {0}")]
    Peer(#[from] PeerError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the customer store, the peer clients and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: NodeConfig,
    store: Arc<dyn CustomerStore>,
    sync: SyncClient,
    fetch: FetchBroker,
}

impl AppState {
    /// Create application state backed by a [`FileStore`] at `config.data_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store root cannot be created or the peer HTTP
    /// client cannot be built.
    pub fn new(config: NodeConfig) -> Result<Self, StateError> {
        let store = Arc::new(FileStore::new(&config.data_dir)?);
        Self::with_store(config, store)
    }

    /// Create application state over an existing store.
    ///
    /// # Errors
    ///
    /// Returns an error if the peer HTTP client cannot be built.
    pub fn with_store(
        config: NodeConfig,
        store: Arc<dyn CustomerStore>,
    ) -> Result<Self, StateError> {
        let http = peer::build_http_client(&config.peer)?;
        let sync = SyncClient::new(http.clone(), config.peer.sync_url.clone());
        let fetch = FetchBroker::new(http, config.peer.fetch_url.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                sync,
                fetch,
            }),
        })
    }

    /// Get a reference to the node configuration.
    #[must_use]
    pub fn config(&self) -> &NodeConfig {
        &self.inner.config
    }

    /// Get a reference to the customer store.
    #[must_use]
    pub fn store(&self) -> &dyn CustomerStore {
        self.inner.store.as_ref()
    }

    /// Get a reference to the peer sync client.
    #[must_use]
    pub fn sync(&self) -> &SyncClient {
        &self.inner.sync
    }

    /// Get a reference to the peer fetch broker.
    #[must_use]
    pub fn fetch(&self) -> &FetchBroker {
        &self.inner.fetch
    }
}
