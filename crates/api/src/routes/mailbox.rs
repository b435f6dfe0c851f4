//! Mailbox candidates, staging and receipt scans.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tally_core::approval::PendingTransaction;
use tally_core::ingest::{CandidateMeta, StageReport};
use tally_shared::types::OwnerId;

use crate::AppState;
use crate::error::{ApiError, ApiResult};

/// Upper bound on a receipt upload, base64 included.
const MAX_RECEIPT_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Creates the mailbox and receipt routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/owners/{owner_id}/mailbox/candidates", get(list_candidates))
        .route("/owners/{owner_id}/mailbox/stage", post(stage_messages))
        .route(
            "/owners/{owner_id}/receipts",
            post(scan_receipt).layer(DefaultBodyLimit::max(MAX_RECEIPT_BODY_BYTES)),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for candidate listing.
#[derive(Debug, Deserialize)]
pub struct CandidatesQuery {
    /// Only list messages since the last sync.
    #[serde(default)]
    pub incremental: bool,
}

/// Request body for staging messages.
#[derive(Debug, Deserialize)]
pub struct StageRequest {
    /// Provider message ids.
    pub message_ids: Vec<String>,
}

/// Request body for a receipt scan.
#[derive(Debug, Deserialize)]
pub struct ReceiptRequest {
    /// Image MIME type, e.g. `image/jpeg`.
    pub mime_type: String,
    /// Standard base64 image bytes.
    pub data_base64: String,
}

/// Response for a receipt scan.
#[derive(Debug, Serialize)]
pub struct ReceiptResponse {
    /// Whether a transaction was found.
    pub found: bool,
    /// The staged row, if any.
    pub pending: Option<PendingTransaction>,
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_candidates(
    State(state): State<AppState>,
    Path(owner_id): Path<OwnerId>,
    Query(query): Query<CandidatesQuery>,
) -> ApiResult<Json<Vec<CandidateMeta>>> {
    let candidates = state
        .fetcher
        .list_candidates(owner_id, query.incremental, Utc::now())
        .await?;
    Ok(Json(candidates))
}

async fn stage_messages(
    State(state): State<AppState>,
    Path(owner_id): Path<OwnerId>,
    Json(request): Json<StageRequest>,
) -> ApiResult<Json<StageReport>> {
    if request.message_ids.iter().all(|id| id.trim().is_empty()) {
        return Err(ApiError::validation("message_ids must contain at least one id"));
    }
    let report = state
        .pipeline
        .stage(owner_id, &request.message_ids, Utc::now())
        .await?;
    Ok(Json(report))
}

async fn scan_receipt(
    State(state): State<AppState>,
    Path(owner_id): Path<OwnerId>,
    Json(request): Json<ReceiptRequest>,
) -> ApiResult<(StatusCode, Json<ReceiptResponse>)> {
    if !request.mime_type.starts_with("image/") {
        return Err(ApiError::validation("mime_type must be an image type"));
    }
    let data = STANDARD
        .decode(request.data_base64.trim())
        .map_err(|e| ApiError::validation(format!("data_base64 is not valid base64: {e}")))?;
    if data.is_empty() {
        return Err(ApiError::validation("receipt image is empty"));
    }

    let pending = state
        .pipeline
        .stage_receipt(owner_id, &request.mime_type, data, Utc::now())
        .await?;
    let status = if pending.is_some() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(ReceiptResponse {
            found: pending.is_some(),
            pending,
        }),
    ))
}
