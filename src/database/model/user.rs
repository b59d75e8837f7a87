use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account created by the OAuth adapter; `id` is the session identity.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = User)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
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
