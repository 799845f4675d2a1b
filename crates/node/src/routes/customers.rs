//! Customer directory.

use std::collections::BTreeSet;

use axum::{Json, extract::State};
use customer_vault_core::CustomerKey;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::state::AppState;

/// List every customer with at least one stored artifact.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<BTreeSet<CustomerKey>>> {
    let customers = state.store().list_customers().await?;
    debug!(count = customers.len(), "listed customers");
    Ok(Json(customers))
}
