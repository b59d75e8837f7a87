use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = Flight)]
#[sea_orm(table_name = "flight")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub fid: i32,
    pub origin_airport: String,
    pub dest_airport: String,
    pub depart_date_time: DateTime,
    pub arrive_date_time: DateTime,
    pub price_usd: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::airport::Entity",
        from = "Column::OriginAirport",
        to = "super::airport::Column::Icao"
    )]
    OriginAirport,
    #[sea_orm(
        belongs_to = "super::airport::Entity",
        from = "Column::DestAirport",
        to = "super::airport::Column::Icao"
    )]
    DestAirport,
    #[sea_orm(has_many = "super::ticket_buy::Entity")]
    TicketBuy,
}

impl Related<super::ticket_buy::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TicketBuy.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
