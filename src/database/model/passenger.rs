use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = Passenger)]
#[sea_orm(table_name = "passenger")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub pid: i32,
    pub first_name: String,
    pub last_name: String,
    pub passport_no: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ticket_buy::Entity")]
    TicketBuy,
}

impl Related<super::ticket_buy::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TicketBuy.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
