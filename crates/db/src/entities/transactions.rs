//! `SeaORM` Entity for transactions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::TransactionKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub kind: TransactionKind,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    pub category_id: Option<Uuid>,
    pub asset_id: Option<Uuid>,
    pub liability_id: Option<Uuid>,
    pub occurred_at: DateTimeWithTimeZone,
    pub description: String,
    pub origin_method: String,
    pub source_message_id: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assets::Entity",
        from = "Column::AssetId",
        to = "super::assets::Column::Id"
    )]
    Assets,
    #[sea_orm(
        belongs_to = "super::liabilities::Entity",
        from = "Column::LiabilityId",
        to = "super::liabilities::Column::Id"
    )]
    Liabilities,
}

impl Related<super::assets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assets.def()
    }
}

impl Related<super::liabilities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Liabilities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
