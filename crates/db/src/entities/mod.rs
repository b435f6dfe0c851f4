//! `SeaORM` entity definitions.

pub mod assets;
pub mod budget_alerts;
pub mod budgets;
pub mod categories;
pub mod liabilities;
pub mod mailbox_connections;
pub mod pending_transactions;
pub mod sea_orm_active_enums;
pub mod transactions;
