//! Request correlation across the node pair.
//!
//! Each request gets an ID, either the one the caller sent (a peer node or a
//! load balancer) or a fresh UUID v4. The ID and the serving node's role are
//! recorded on the request span and the Sentry scope, and both are returned
//! as response headers so a replicated upload can be traced on either side.

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

use crate::config::NodeRole;

/// Header carrying the request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Header naming the role of the node that answered.
pub const NODE_ROLE_HEADER: &str = "x-customer-vault-node";

/// Tag every request with a request ID and the serving node's role.
///
/// Install with `axum::middleware::from_fn_with_state(role, request_id_middleware)`.
pub async fn request_id_middleware(
    State(role): State<NodeRole>,
    request: Request,
    next: Next,
) -> Response {
    let request_id = incoming_request_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = Span::current();
    span.record("request_id", request_id.as_str());
    span.record("node_role", role.as_str());

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
        scope.set_tag("node_role", role.as_str());
    });

    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        headers.insert(REQUEST_ID_HEADER, value);
    }
    headers.insert(NODE_ROLE_HEADER, HeaderValue::from_static(role.as_str()));

    response
}

/// A usable upstream request ID, if the caller sent one.
fn incoming_request_id(request: &Request) -> Option<String> {
    request
        .headers()
        .get(REQUEST_ID_HEADER)?
        .to_str()
        .ok()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn request_with(id: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/health");
        if let Some(id) = id {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_incoming_request_id() {
        assert_eq!(
            incoming_request_id(&request_with(Some("peer-42"))).as_deref(),
            Some("peer-42")
        );
        assert_eq!(
            incoming_request_id(&request_with(Some("  padded "))).as_deref(),
            Some("padded")
        );
        assert_eq!(incoming_request_id(&request_with(Some("   "))), None);
        assert_eq!(incoming_request_id(&request_with(None)), None);
    }
}
