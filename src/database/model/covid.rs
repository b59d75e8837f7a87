use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One row per country per reporting day.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = Covid)]
#[sea_orm(table_name = "covid")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub alpha3: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub entry_date: Date,
    pub new_case_no: i64,
    pub total_case_no: i64,
    pub new_death_no: i64,
    pub total_death_no: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::country::Entity",
        from = "Column::Alpha3",
        to = "super::country::Column::Alpha3"
    )]
    Country,
}

impl Related<super::country::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Country.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
