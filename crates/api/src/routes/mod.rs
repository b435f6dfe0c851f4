//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod budgets;
pub mod health;
pub mod internal;
pub mod mailbox;
pub mod pending;
pub mod transactions;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(transactions::routes())
        .merge(pending::routes())
        .merge(mailbox::routes())
        .merge(budgets::routes())
        .merge(internal::routes())
}
