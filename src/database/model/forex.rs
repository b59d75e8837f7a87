use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Cached conversion rate. Rows are only ever inserted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = Forex)]
#[sea_orm(table_name = "forex")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub entry_date: Date,
    #[sea_orm(primary_key, auto_increment = false)]
    pub currency_base: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub currency_against: String,
    pub rate: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::currency::Entity",
        from = "Column::CurrencyAgainst",
        to = "super::currency::Column::Currency"
    )]
    CurrencyAgainst,
}

impl Related<super::currency::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CurrencyAgainst.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
