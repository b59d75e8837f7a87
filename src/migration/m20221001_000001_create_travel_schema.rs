use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Currency::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Currency::Currency).string_len(3).not_null().primary_key())
                    .col(ColumnDef::new(Currency::CurrencyName).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Country::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Country::Alpha3).string_len(3).not_null().primary_key())
                    .col(ColumnDef::new(Country::Alpha2).string_len(2).not_null())
                    .col(ColumnDef::new(Country::CountryName).string().not_null())
                    .col(ColumnDef::new(Country::Currency).string_len(3))
                    .foreign_key(
                        ForeignKey::create()
                            .from(Country::Table, Country::Currency)
                            .to(Currency::Table, Currency::Currency),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(City::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(City::Cid).big_integer().not_null().primary_key())
                    .col(ColumnDef::new(City::CityName).string().not_null())
                    .col(ColumnDef::new(City::Latitude).double().not_null())
                    .col(ColumnDef::new(City::Longitude).double().not_null())
                    .col(ColumnDef::new(City::Population).big_integer())
                    .col(ColumnDef::new(City::Capital).boolean().not_null().default(false))
                    .col(ColumnDef::new(City::Alpha3).string_len(3).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(City::Table, City::Alpha3)
                            .to(Country::Table, Country::Alpha3),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Airport::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Airport::Icao).string_len(4).not_null().primary_key())
                    .col(ColumnDef::new(Airport::Iata).string_len(3))
                    .col(ColumnDef::new(Airport::AirportName).string().not_null())
                    .col(ColumnDef::new(Airport::Latitude).double().not_null())
                    .col(ColumnDef::new(Airport::Longitude).double().not_null())
                    .col(ColumnDef::new(Airport::Cid).big_integer())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Airport::Table, Airport::Cid)
                            .to(City::Table, City::Cid),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Flight::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Flight::Fid)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Flight::OriginAirport).string_len(4).not_null())
                    .col(ColumnDef::new(Flight::DestAirport).string_len(4).not_null())
                    .col(ColumnDef::new(Flight::DepartDateTime).date_time().not_null())
                    .col(ColumnDef::new(Flight::ArriveDateTime).date_time().not_null())
                    .col(ColumnDef::new(Flight::PriceUsd).double().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Flight::Table, Flight::OriginAirport)
                            .to(Airport::Table, Airport::Icao),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Flight::Table, Flight::DestAirport)
                            .to(Airport::Table, Airport::Icao),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Hospital::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Hospital::Hid)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Hospital::HospitalName).string().not_null())
                    .col(ColumnDef::new(Hospital::Address).string().not_null())
                    .col(ColumnDef::new(Hospital::Phone).string())
                    .col(ColumnDef::new(Hospital::Latitude).double().not_null())
                    .col(ColumnDef::new(Hospital::Longitude).double().not_null())
                    .col(ColumnDef::new(Hospital::Cid).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Hospital::Table, Hospital::Cid)
                            .to(City::Table, City::Cid),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Covid::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Covid::Alpha3).string_len(3).not_null())
                    .col(ColumnDef::new(Covid::EntryDate).date().not_null())
                    .col(ColumnDef::new(Covid::NewCaseNo).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Covid::TotalCaseNo).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Covid::NewDeathNo).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Covid::TotalDeathNo).big_integer().not_null().default(0))
                    .primary_key(Index::create().col(Covid::Alpha3).col(Covid::EntryDate))
                    .foreign_key(
                        ForeignKey::create()
                            .from(Covid::Table, Covid::Alpha3)
                            .to(Country::Table, Country::Alpha3),
                    )
                    .to_owned(),
            )
            .await?;

        // The composite key doubles as the guard against two concurrent cache misses
        manager
            .create_table(
                Table::create()
                    .table(Forex::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Forex::EntryDate).date().not_null())
                    .col(ColumnDef::new(Forex::CurrencyBase).string_len(3).not_null())
                    .col(ColumnDef::new(Forex::CurrencyAgainst).string_len(3).not_null())
                    .col(ColumnDef::new(Forex::Rate).double().not_null())
                    .primary_key(
                        Index::create()
                            .col(Forex::EntryDate)
                            .col(Forex::CurrencyBase)
                            .col(Forex::CurrencyAgainst),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::Name).string())
                    .col(ColumnDef::new(Users::Email).string().unique_key())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Passenger::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Passenger::Pid)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Passenger::FirstName).string().not_null())
                    .col(ColumnDef::new(Passenger::LastName).string().not_null())
                    .col(ColumnDef::new(Passenger::PassportNo).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TicketBuy::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TicketBuy::Uid).string().not_null())
                    .col(ColumnDef::new(TicketBuy::Pid).integer().not_null())
                    .col(ColumnDef::new(TicketBuy::Fid).integer().not_null())
                    .col(ColumnDef::new(TicketBuy::SeatNo).string_len(4))
                    .col(ColumnDef::new(TicketBuy::Class).string_len(16).not_null())
                    .primary_key(
                        Index::create()
                            .col(TicketBuy::Uid)
                            .col(TicketBuy::Pid)
                            .col(TicketBuy::Fid),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TicketBuy::Table, TicketBuy::Uid)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TicketBuy::Table, TicketBuy::Pid)
                            .to(Passenger::Table, Passenger::Pid),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TicketBuy::Table, TicketBuy::Fid)
                            .to(Flight::Table, Flight::Fid),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(TicketBuy::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Passenger::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Forex::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Covid::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Hospital::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Flight::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Airport::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(City::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Country::Table).to_owned()).await?;
        manager
            .drop_table(Table::drop().table(Currency::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Currency {
    Table,
    Currency,
    CurrencyName,
}

#[derive(DeriveIden)]
enum Country {
    Table,
    Alpha3,
    Alpha2,
    CountryName,
    Currency,
}

#[derive(DeriveIden)]
enum City {
    Table,
    Cid,
    CityName,
    Latitude,
    Longitude,
    Population,
    Capital,
    Alpha3,
}

#[derive(DeriveIden)]
enum Airport {
    Table,
    Icao,
    Iata,
    AirportName,
    Latitude,
    Longitude,
    Cid,
}

#[derive(DeriveIden)]
enum Flight {
    Table,
    Fid,
    OriginAirport,
    DestAirport,
    DepartDateTime,
    ArriveDateTime,
    PriceUsd,
}

#[derive(DeriveIden)]
enum Hospital {
    Table,
    Hid,
    HospitalName,
    Address,
    Phone,
    Latitude,
    Longitude,
    Cid,
}

#[derive(DeriveIden)]
enum Covid {
    Table,
    Alpha3,
    EntryDate,
    NewCaseNo,
    TotalCaseNo,
    NewDeathNo,
    TotalDeathNo,
}

#[derive(DeriveIden)]
enum Forex {
    Table,
    EntryDate,
    CurrencyBase,
    CurrencyAgainst,
    Rate,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
    Email,
}

#[derive(DeriveIden)]
enum Passenger {
    Table,
    Pid,
    FirstName,
    LastName,
    PassportNo,
}

#[derive(DeriveIden)]
enum TicketBuy {
    Table,
    Uid,
    Pid,
    Fid,
    SeatNo,
    Class,
}
