use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_flight_route_depart")
                    .table(Flight::Table)
                    .col(Flight::OriginAirport)
                    .col(Flight::DestAirport)
                    .col(Flight::DepartDateTime)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_hospital_cid")
                    .table(Hospital::Table)
                    .col(Hospital::Cid)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_airport_cid")
                    .table(Airport::Table)
                    .col(Airport::Cid)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_airport_cid").table(Airport::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_hospital_cid").table(Hospital::Table).to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_flight_route_depart")
                    .table(Flight::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Flight {
    Table,
    OriginAirport,
    DestAirport,
    DepartDateTime,
}

#[derive(DeriveIden)]
enum Hospital {
    Table,
    Cid,
}

#[derive(DeriveIden)]
enum Airport {
    Table,
    Cid,
}
