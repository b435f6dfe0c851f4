//! Review of staged transactions.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use chrono::Utc;
use serde::Deserialize;
use tally_core::approval::{ApprovalOutcome, BatchResult, PendingEdit, PendingTransaction};
use tally_shared::types::{OwnerId, PendingTransactionId};

use crate::AppState;
use crate::error::ApiResult;

/// Creates the pending-review routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/owners/{owner_id}/pending", get(list_pending))
        .route("/owners/{owner_id}/pending/approve", post(approve_selected))
        .route("/owners/{owner_id}/pending/reject", post(reject_selected))
        .route("/owners/{owner_id}/pending/{pending_id}", put(update_pending))
        .route(
            "/owners/{owner_id}/pending/{pending_id}/approve",
            post(approve_pending),
        )
        .route(
            "/owners/{owner_id}/pending/{pending_id}/reject",
            post(reject_pending),
        )
}

/// Request body for batch operations.
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    /// Items to process.
    pub ids: Vec<PendingTransactionId>,
}

async fn list_pending(
    State(state): State<AppState>,
    Path(owner_id): Path<OwnerId>,
) -> ApiResult<Json<Vec<PendingTransaction>>> {
    Ok(Json(state.approvals.list_pending(owner_id).await?))
}

async fn update_pending(
    State(state): State<AppState>,
    Path((owner_id, pending_id)): Path<(OwnerId, PendingTransactionId)>,
    Json(edit): Json<PendingEdit>,
) -> ApiResult<Json<PendingTransaction>> {
    let updated = state
        .approvals
        .update_pending(owner_id, pending_id, edit, Utc::now())
        .await?;
    Ok(Json(updated))
}

async fn approve_pending(
    State(state): State<AppState>,
    Path((owner_id, pending_id)): Path<(OwnerId, PendingTransactionId)>,
) -> ApiResult<Json<ApprovalOutcome>> {
    let outcome = state
        .approvals
        .approve(owner_id, pending_id, Utc::now())
        .await?;
    Ok(Json(outcome))
}

async fn reject_pending(
    State(state): State<AppState>,
    Path((owner_id, pending_id)): Path<(OwnerId, PendingTransactionId)>,
) -> ApiResult<Json<PendingTransaction>> {
    let rejected = state
        .approvals
        .reject(owner_id, pending_id, Utc::now())
        .await?;
    Ok(Json(rejected))
}

async fn approve_selected(
    State(state): State<AppState>,
    Path(owner_id): Path<OwnerId>,
    Json(request): Json<BatchRequest>,
) -> ApiResult<Json<BatchResult>> {
    let result = state
        .approvals
        .approve_selected(owner_id, &request.ids, Utc::now())
        .await?;
    Ok(Json(result))
}

async fn reject_selected(
    State(state): State<AppState>,
    Path(owner_id): Path<OwnerId>,
    Json(request): Json<BatchRequest>,
) -> ApiResult<Json<BatchResult>> {
    let result = state
        .approvals
        .reject_selected(owner_id, &request.ids, Utc::now())
        .await?;
    Ok(Json(result))
}
