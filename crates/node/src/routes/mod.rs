//! HTTP route handlers for the node.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (store root usable)
//!
//! # Profile images
//! POST /upload-profile/{customerId}     - Multipart `file` upload, stored as WebP
//! GET  /profile/{customerId}            - Stored image (image/webp)
//! POST /fetch-from-local/{customerId}   - Ask the peer to push its copy here
//! POST /push-to-peer/{customerId}       - Push our copy to the peer (peer side of fetch)
//!
//! # Customer directory
//! GET  /all-customers                   - Every known customer key
//!
//! # Wishlists & referrals
//! POST /wishlist/{customerId}           - Replace wishlist (JSON array)
//! GET  /wishlist/{customerId}           - Wishlist, `[]` if absent
//! POST /referrals/{customerId}          - Replace referral record (JSON object)
//! GET  /referrals/{customerId}          - Referral record, `{}` if absent
//! ```

pub mod customers;
pub mod profile;
pub mod referrals;
pub mod wishlist;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use serde_json::Value;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::error::AppError;
use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Body of every successful write.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Body of proxy fetch / push acknowledgements.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

/// Create all customer routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Profile images
        .route("/upload-profile/{customer_id}", post(profile::upload))
        .route("/profile/{customer_id}", get(profile::show))
        .route("/fetch-from-local/{customer_id}", post(profile::fetch_from_peer))
        .route("/push-to-peer/{customer_id}", post(profile::push_to_peer))
        // Customer directory
        .route("/all-customers", get(customers::index))
        // Wishlists & referrals
        .route(
            "/wishlist/{customer_id}",
            get(wishlist::show).post(wishlist::save),
        )
        .route(
            "/referrals/{customer_id}",
            get(referrals::show).post(referrals::save),
        )
}

/// Build the complete application: routes, health checks and middleware.
pub fn app(state: AppState) -> Router {
    let max_upload_bytes = state.config().max_upload_bytes;
    let role = state.config().role;

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(axum::middleware::from_fn_with_state(
            role,
            request_id_middleware,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        node_role = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store root is not usable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().check().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "store not ready");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Parse a request body as JSON, whatever its declared content type.
fn parse_json_body(body: &[u8]) -> Result<Value, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, Response};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::config::NodeConfig;
    use crate::state::AppState;
    use crate::store::{CustomerStore, FileStore};

    /// Build an app over a fresh temporary file store.
    pub(crate) fn test_app(config: impl FnOnce(&mut NodeConfig)) -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let mut node_config = NodeConfig::local_defaults(dir.path().join("customer_data"));
        config(&mut node_config);
        let store: Arc<dyn CustomerStore> =
            Arc::new(FileStore::new(&node_config.data_dir).unwrap());
        let state = AppState::with_store(node_config, store).unwrap();
        (dir, super::app(state))
    }

    /// Send one request through the router.
    pub(crate) async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
        app.clone().oneshot(request).await.unwrap()
    }

    /// Read the full response body as bytes.
    pub(crate) async fn body_bytes(response: Response<Body>) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec()
    }

    /// Read the full response body as JSON.
    pub(crate) async fn body_json(response: Response<Body>) -> serde_json::Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    /// Build a multipart body with a single field.
    pub(crate) fn multipart_request(uri: &str, field: &str, data: &[u8]) -> Request<Body> {
        let boundary = "customer-vault-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"upload.bin\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    /// Build a POST with a raw JSON body.
    pub(crate) fn json_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    /// Build a GET.
    pub(crate) fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }
}
