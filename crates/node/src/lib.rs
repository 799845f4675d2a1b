//! Customer vault node library.
//!
//! One node stores per-customer artifacts (profile image, wishlist,
//! referral record) under a data directory and serves them over HTTP. Two
//! nodes, a cloud node and a local node, pair up: profile uploads on one are
//! replicated best-effort to the other, and either can ask the other to
//! push a profile back.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod codec;
pub mod config;
pub mod error;
pub mod middleware;
pub mod peer;
pub mod routes;
pub mod state;
pub mod store;
