//! Profile image route handlers.
//!
//! Uploads are re-encoded to the canonical WebP format before storage;
//! replica uploads that already are WebP are stored as received. Once
//! the local write succeeds the image is handed to the sync client; whatever
//! happens to that push, the response has already been decided by the local
//! write.

use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use customer_vault_core::CustomerKey;
use serde::Serialize;
use tracing::{debug, info, instrument};

use super::StatusResponse;
use crate::codec::{self, CANONICAL_CONTENT_TYPE};
use crate::error::{AppError, Result};
use crate::peer::{PeerError, REPLICA_HEADER, SyncJob};
use crate::state::AppState;

/// Name of the multipart field carrying the image.
const FILE_FIELD: &str = "file";

/// Successful upload response.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    /// Where the image was stored.
    pub path: String,
    /// Where the image can be read back.
    pub url: String,
}

/// Upload a profile image.
///
/// Uploads carrying [`REPLICA_HEADER`] came from the peer. They are not
/// forwarded again, and WebP replicas skip re-encoding.
#[instrument(skip(state, headers, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let key = CustomerKey::normalize(Some(&customer_id));
    let raw = read_file_field(multipart).await?;
    let replica = headers.contains_key(REPLICA_HEADER);

    let canonical = tokio::task::spawn_blocking(move || {
        if replica {
            codec::accept_replica(&raw)
        } else {
            codec::encode_canonical(&raw)
        }
    })
    .await
    .map_err(|e| AppError::Internal(format!("codec task failed: {e}")))??;

    let path = state.store().put_profile(&key, canonical.bytes.clone()).await?;
    info!(
        %key,
        width = canonical.width,
        height = canonical.height,
        size = canonical.bytes.len(),
        "profile stored"
    );

    if replica {
        debug!(%key, "replica upload from peer, not forwarding");
    } else {
        state.sync().dispatch(SyncJob {
            raw_id: customer_id,
            key: key.clone(),
            image: canonical.bytes,
        });
    }

    Ok(Json(UploadResponse {
        message: "Profile uploaded successfully",
        path,
        url: format!("/profile/{key}"),
    }))
}

/// Serve the stored profile image.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<Response> {
    let key = CustomerKey::normalize(Some(&customer_id));

    match state.store().get_profile(&key).await? {
        Some(image) => Ok(([(header::CONTENT_TYPE, CANONICAL_CONTENT_TYPE)], image).into_response()),
        None => Err(AppError::NotFound("Profile not found".to_string())),
    }
}

/// Ask the peer to push its copy of the profile to this node.
///
/// Returns the peer's status code as-is. The transfer itself arrives later
/// as a replica upload.
#[instrument(skip(state))]
pub async fn fetch_from_peer(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<(StatusCode, Json<StatusResponse>)> {
    let status = state.fetch().request_fetch(&customer_id).await?;
    info!(%status, "fetch requested from peer");

    Ok((
        status,
        Json(StatusResponse {
            status: "requested from local",
        }),
    ))
}

/// Push the stored profile to the peer in the background.
///
/// This is what a peer's fetch request lands on.
#[instrument(skip(state))]
pub async fn push_to_peer(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<(StatusCode, Json<StatusResponse>)> {
    if !state.sync().is_enabled() {
        return Err(PeerError::NotConfigured("sync").into());
    }

    let key = CustomerKey::normalize(Some(&customer_id));
    let image = state
        .store()
        .get_profile(&key)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    state.sync().dispatch(SyncJob {
        raw_id: customer_id,
        key,
        image,
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(StatusResponse {
            status: "push scheduled",
        }),
    ))
}

/// Pull the `file` field out of a multipart body.
async fn read_file_field(
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Bytes> {
    let mut multipart = multipart.map_err(|e| {
        debug!(error = %e, "upload is not a multipart body");
        no_file()
    })?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?;
        // An empty file part is what browsers send when nothing was picked.
        if data.is_empty() {
            return Err(no_file());
        }
        return Ok(data);
    }

    Err(no_file())
}

fn no_file() -> AppError {
    AppError::BadRequest("No file uploaded".to_string())
}
