//! Wishlist route handlers.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};
use customer_vault_core::{CustomerKey, Wishlist};
use tracing::{info, instrument};

use super::{MessageResponse, parse_json_body};
use crate::error::Result;
use crate::state::AppState;

/// Replace a customer's wishlist.
///
/// The body must be a JSON array; anything else is rejected and the stored
/// wishlist is left untouched.
#[instrument(skip(state, body))]
pub async fn save(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    body: Bytes,
) -> Result<Json<MessageResponse>> {
    let key = CustomerKey::normalize(Some(&customer_id));
    let wishlist = Wishlist::try_from(parse_json_body(&body)?)?;

    state.store().put_wishlist(&key, &wishlist).await?;
    info!(%key, items = wishlist.len(), "wishlist saved");

    Ok(Json(MessageResponse {
        message: "Wishlist saved successfully",
    }))
}

/// Return a customer's wishlist, `[]` if none was saved.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<Json<Wishlist>> {
    let key = CustomerKey::normalize(Some(&customer_id));
    let wishlist = state.store().get_wishlist(&key).await?.unwrap_or_default();
    Ok(Json(wishlist))
}
