//! `SeaORM` Entity for budgets table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::BudgetPeriod;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub category_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    pub period_type: BudgetPeriod,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub alert_at_percentage: Decimal,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::budget_alerts::Entity")]
    BudgetAlerts,
}

impl Related<super::budget_alerts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetAlerts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
