//! Proxy fetch: ask the peer to push a profile to this node.

use axum::http::StatusCode;
use tracing::{debug, instrument};
use url::Url;

use super::{PeerError, endpoint};

/// Asks the peer to start pushing a customer's profile toward this node.
///
/// The transfer itself happens later, out of band, through the peer's own
/// [`super::SyncClient`]. This only reports whether the peer accepted the
/// request.
#[derive(Clone)]
pub struct FetchBroker {
    http: reqwest::Client,
    base: Option<Url>,
}

impl FetchBroker {
    /// Create a broker. With no `base`, every request fails with
    /// `PeerError::NotConfigured`.
    #[must_use]
    pub const fn new(http: reqwest::Client, base: Option<Url>) -> Self {
        Self { http, base }
    }

    /// Whether a peer fetch endpoint is configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.base.is_some()
    }

    /// Send the fetch request and return the peer's status verbatim.
    ///
    /// # Errors
    ///
    /// Returns `PeerError::NotConfigured` without a peer, or
    /// `PeerError::Transport` if the peer cannot be reached or fails before
    /// answering. Any answer, success or not, is `Ok`.
    #[instrument(skip(self))]
    pub async fn request_fetch(&self, raw_id: &str) -> Result<StatusCode, PeerError> {
        let base = self.base.as_ref().ok_or(PeerError::NotConfigured("fetch"))?;
        let url = endpoint(base, raw_id)?;

        let response = self.http.post(url).send().await?;
        let status = response.status();
        debug!(%status, "peer acknowledged fetch request");
        Ok(status)
    }
}
