//! HTTP middleware stack for the node.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with method, uri, status, latency)
//! 3. Request ID and node role (span fields, Sentry tags, response headers)
//! 4. Body limit (caps profile uploads)

pub mod request_id;

pub use request_id::{NODE_ROLE_HEADER, REQUEST_ID_HEADER, request_id_middleware};
