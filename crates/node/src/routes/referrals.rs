//! Referral record route handlers.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};
use customer_vault_core::{CustomerKey, ReferralRecord};
use tracing::{info, instrument};

use super::{MessageResponse, parse_json_body};
use crate::error::Result;
use crate::state::AppState;

/// Replace a customer's referral record. The body must be a JSON object.
#[instrument(skip(state, body))]
pub async fn save(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    body: Bytes,
) -> Result<Json<MessageResponse>> {
    let key = CustomerKey::normalize(Some(&customer_id));
    let record = ReferralRecord::try_from(parse_json_body(&body)?)?;

    state.store().put_referrals(&key, &record).await?;
    info!(%key, "referral record saved");

    Ok(Json(MessageResponse {
        message: "Referral saved successfully",
    }))
}

/// Return a customer's referral record, `{}` if none was saved.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<Json<ReferralRecord>> {
    let key = CustomerKey::normalize(Some(&customer_id));
    let record = state.store().get_referrals(&key).await?.unwrap_or_default();
    Ok(Json(record))
}
