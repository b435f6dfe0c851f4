//! Transaction routes.
//!
//! Every mutation returns the affected row plus any balance warnings.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tally_core::ledger::{
    AccountRef, LedgerOutcome, ORIGIN_MANUAL, Transaction, TransactionDraft, TransactionKind,
};
use tally_shared::types::{CategoryId, OwnerId, TransactionId};

use crate::AppState;
use crate::error::ApiResult;

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/owners/{owner_id}/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route(
            "/owners/{owner_id}/transactions/{transaction_id}",
            get(get_transaction)
                .put(update_transaction)
                .delete(delete_transaction),
        )
}

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters for listing transactions.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Page size.
    pub limit: Option<u64>,
}

/// Request body for creating or replacing a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    /// Income or expense.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Positive amount.
    pub amount: Decimal,
    /// Category.
    pub category_id: Option<CategoryId>,
    /// Linked account, e.g. `{"asset": "<id>"}`.
    pub account: Option<AccountRef>,
    /// Defaults to now.
    pub occurred_at: Option<DateTime<Utc>>,
    /// Free text.
    #[serde(default)]
    pub description: String,
}

impl TransactionRequest {
    fn into_draft(self, now: DateTime<Utc>) -> TransactionDraft {
        TransactionDraft {
            kind: self.kind,
            amount: self.amount,
            category_id: self.category_id,
            account: self.account,
            occurred_at: self.occurred_at.unwrap_or(now),
            description: self.description,
            origin_method: ORIGIN_MANUAL.to_string(),
            source_message_id: None,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_transactions(
    State(state): State<AppState>,
    Path(owner_id): Path<OwnerId>,
    Query(query): Query<ListTransactionsQuery>,
) -> ApiResult<Json<Vec<Transaction>>> {
    Ok(Json(state.ledger.list(owner_id, query.limit).await?))
}

async fn create_transaction(
    State(state): State<AppState>,
    Path(owner_id): Path<OwnerId>,
    Json(request): Json<TransactionRequest>,
) -> ApiResult<(StatusCode, Json<LedgerOutcome>)> {
    let now = Utc::now();
    let outcome = state
        .ledger
        .create(owner_id, request.into_draft(now), now)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn get_transaction(
    State(state): State<AppState>,
    Path((owner_id, transaction_id)): Path<(OwnerId, TransactionId)>,
) -> ApiResult<Json<Transaction>> {
    Ok(Json(state.ledger.get(owner_id, transaction_id).await?))
}

async fn update_transaction(
    State(state): State<AppState>,
    Path((owner_id, transaction_id)): Path<(OwnerId, TransactionId)>,
    Json(request): Json<TransactionRequest>,
) -> ApiResult<Json<LedgerOutcome>> {
    let now = Utc::now();
    let outcome = state
        .ledger
        .update(owner_id, transaction_id, request.into_draft(now), now)
        .await?;
    Ok(Json(outcome))
}

async fn delete_transaction(
    State(state): State<AppState>,
    Path((owner_id, transaction_id)): Path<(OwnerId, TransactionId)>,
) -> ApiResult<Json<LedgerOutcome>> {
    let outcome = state
        .ledger
        .delete(owner_id, transaction_id, Utc::now())
        .await?;
    Ok(Json(outcome))
}
