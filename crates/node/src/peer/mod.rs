//! Outbound calls to the cooperating peer node.
//!
//! Two directions share one `reqwest::Client`:
//!
//! - [`SyncClient`] pushes a freshly stored profile to the peer's ingestion
//!   endpoint. Fire-and-forget: failures are logged, never surfaced.
//! - [`FetchBroker`] asks the peer to push a profile back to this node and
//!   returns the peer's status code without waiting for the transfer.
//!
//! Both address the peer as `<configured base URL>/<raw customer id>`; the
//! peer normalizes the id itself.

pub mod fetch;
pub mod sync;

use axum::http::StatusCode;
use thiserror::Error;
use url::Url;

use crate::config::PeerConfig;

pub use fetch::FetchBroker;
pub use sync::{SyncClient, SyncJob};

/// Header marking an upload as a replica pushed by a peer.
///
/// Replica uploads are stored but never forwarded again, so two nodes
/// configured to sync to each other cannot loop.
pub const REPLICA_HEADER: &str = "x-customer-vault-replica";

/// Errors from a peer round trip.
#[derive(Debug, Error)]
pub enum PeerError {
    /// No endpoint is configured for this direction.
    #[error("peer {0} endpoint is not configured")]
    NotConfigured(&'static str),

    /// The peer base URL cannot carry a path.
    #[error("invalid peer url: {0}")]
    InvalidUrl(String),

    /// Connection refused, timeout, or any failure before a response.
    #[error("peer transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The peer answered with a non-success status.
    #[error("peer responded with {status}")]
    Rejected {
        /// Status returned by the peer.
        status: StatusCode,
    },
}

/// Build the HTTP client shared by sync and fetch.
///
/// # Errors
///
/// Returns `PeerError::Transport` if the client cannot be built.
pub fn build_http_client(config: &PeerConfig) -> Result<reqwest::Client, PeerError> {
    Ok(reqwest::Client::builder()
        .timeout(config.timeout)
        .user_agent(concat!("customer-vault/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Append the raw customer id to a peer base URL as one encoded path segment.
fn endpoint(base: &Url, raw_id: &str) -> Result<Url, PeerError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| PeerError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .push(raw_id);
    Ok(url)
}
