//! Best-effort profile replication to the peer node.

use axum::http::StatusCode;
use bytes::Bytes;
use customer_vault_core::CustomerKey;
use reqwest::multipart::{Form, Part};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, warn};
use url::Url;

use super::{PeerError, REPLICA_HEADER, endpoint};
use crate::codec::{CANONICAL_CONTENT_TYPE, CANONICAL_EXTENSION};

/// One profile to replicate.
#[derive(Debug, Clone)]
pub struct SyncJob {
    /// Identifier exactly as the caller sent it; the peer normalizes it.
    pub raw_id: String,
    /// Normalized key, for logging.
    pub key: CustomerKey,
    /// Stored canonical image bytes.
    pub image: Bytes,
}

/// Pushes stored profile images to the peer's ingestion endpoint.
#[derive(Clone)]
pub struct SyncClient {
    http: reqwest::Client,
    base: Option<Url>,
}

impl SyncClient {
    /// Create a sync client. With no `base`, every dispatch is skipped.
    #[must_use]
    pub const fn new(http: reqwest::Client, base: Option<Url>) -> Self {
        Self { http, base }
    }

    /// Whether a peer ingestion endpoint is configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.base.is_some()
    }

    /// Replicate `job` in a detached background task.
    ///
    /// The task outlives the request that triggered it. Its outcome only
    /// reaches the log; the returned handle is for callers that want to
    /// wait (tests). Returns `None` when sync is not configured.
    pub fn dispatch(&self, job: SyncJob) -> Option<JoinHandle<()>> {
        if !self.is_enabled() {
            debug!(key = %job.key, "peer sync not configured, skipping");
            return None;
        }

        let client = self.clone();
        let span = tracing::info_span!("profile_sync", key = %job.key, raw_id = %job.raw_id);

        Some(tokio::spawn(
            async move {
                match client.push(&job).await {
                    Ok(status) => info!(%status, size = job.image.len(), "profile synced to peer"),
                    Err(e) => warn!(error = %e, "profile sync to peer failed"),
                }
            }
            .instrument(span),
        ))
    }

    /// Make a single upload attempt to the peer and wait for the answer.
    ///
    /// # Errors
    ///
    /// Returns `PeerError` when sync is not configured, the peer is
    /// unreachable, or the peer answers with a non-success status.
    pub async fn push(&self, job: &SyncJob) -> Result<StatusCode, PeerError> {
        let base = self.base.as_ref().ok_or(PeerError::NotConfigured("sync"))?;
        let url = endpoint(base, &job.raw_id)?;

        let part = Part::bytes(job.image.to_vec())
            .file_name(format!("profile.{CANONICAL_EXTENSION}"))
            .mime_str(CANONICAL_CONTENT_TYPE)?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(url)
            .header(REPLICA_HEADER, "1")
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(status)
        } else {
            Err(PeerError::Rejected { status })
        }
    }
}
