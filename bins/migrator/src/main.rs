//! Database migration runner for Tally.
//!
//! Usage:
//!   tally-migrator up      - Run all pending migrations
//!   tally-migrator down    - Rollback last migration
//!   tally-migrator status  - Show migration status
//!   tally-migrator fresh   - Drop all tables and re-run migrations

use sea_orm_migration::prelude::*;
use tally_db::migration::Migrator;

#[tokio::main]
async fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Run the migrator CLI (it sets up its own tracing)
    cli::run_cli(Migrator).await;
}
