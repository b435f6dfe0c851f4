//! Scheduler trigger.
//!
//! Called periodically by an external cron with `Authorization: Bearer <sync.cron_secret>`.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, header::AUTHORIZATION},
    routing::post,
};
use chrono::Utc;
use tally_core::scheduler::SweepReport;
use tally_shared::AppError;

use crate::AppState;
use crate::error::{ApiError, ApiResult};

/// Creates the internal routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/internal/sync", post(run_sync))
}

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

fn authorize(headers: &HeaderMap, secret: &str) -> Result<(), ApiError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token);

    match token {
        // An unset secret disables the endpoint.
        Some(token) if !secret.is_empty() && token == secret => Ok(()),
        _ => Err(ApiError(AppError::Unauthorized(
            "a valid scheduler secret is required".to_string(),
        ))),
    }
}

async fn run_sync(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<SweepReport>> {
    authorize(&headers, &state.cron_secret)?;
    Ok(Json(state.sweep.run(Utc::now()).await?))
}
