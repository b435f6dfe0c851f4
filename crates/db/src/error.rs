//! Mapping of database errors onto the datastore error taxonomy.

use sea_orm::{DbErr, SqlErr};
use tally_core::store::StoreError;

/// Converts a `SeaORM` error, keeping constraint violations distinguishable.
pub(crate) fn store_err(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg) | SqlErr::ForeignKeyConstraintViolation(msg)) => {
            StoreError::Conflict(msg)
        }
        _ => match err {
            DbErr::RecordNotFound(msg) => StoreError::NotFound(msg),
            other => StoreError::Backend(other.to_string()),
        },
    }
}
