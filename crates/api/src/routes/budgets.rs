//! Budget progress routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use chrono::Utc;
use tally_core::budget::BudgetProgress;
use tally_shared::types::OwnerId;

use crate::AppState;
use crate::error::ApiResult;

/// Creates the budget routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/owners/{owner_id}/budgets/progress", get(budget_progress))
}

async fn budget_progress(
    State(state): State<AppState>,
    Path(owner_id): Path<OwnerId>,
) -> ApiResult<Json<Vec<BudgetProgress>>> {
    Ok(Json(
        state.budgets.progress_for_owner(owner_id, Utc::now()).await?,
    ))
}
