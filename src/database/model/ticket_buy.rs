use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum TicketClass {
    #[sea_orm(string_value = "economy")]
    Economy,
    #[sea_orm(string_value = "premium_economy")]
    PremiumEconomy,
    #[sea_orm(string_value = "business")]
    Business,
    #[sea_orm(string_value = "first")]
    First,
}

/// A purchased seat: one passenger on one flight, bought by one user.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = TicketBuy)]
#[sea_orm(table_name = "ticket_buy")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uid: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub pid: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub fid: i32,
    pub seat_no: Option<String>,
    pub class: TicketClass,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::Uid",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::passenger::Entity",
        from = "Column::Pid",
        to = "super::passenger::Column::Pid"
    )]
    Passenger,
    #[sea_orm(
        belongs_to = "super::flight::Entity",
        from = "Column::Fid",
        to = "super::flight::Column::Fid"
    )]
    Flight,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::passenger::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Passenger.def()
    }
}

impl Related<super::flight::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Flight.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
