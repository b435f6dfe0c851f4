//! Budget threshold monitoring.
//!
//! # Modules
//!
//! - `types` - Budget, progress and alert types
//! - `period` - Period windows in the configured timezone
//! - `service` - Pure progress and threshold evaluation
//! - `monitor` - Recomputes progress against the datastore and raises alerts

pub mod error;
pub mod monitor;
pub mod period;
pub mod service;
pub mod store;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::BudgetError;
pub use monitor::{BudgetMonitor, MonitorSettings};
pub use period::PeriodWindow;
pub use service::BudgetService;
pub use store::BudgetStore;
pub use types::{AlertLevel, Budget, BudgetAlert, BudgetProgress, PeriodType};
