use sea_orm_migration::prelude::*;

mod m20221001_000001_create_travel_schema;
mod m20221001_000002_create_search_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20221001_000001_create_travel_schema::Migration),
            Box::new(m20221001_000002_create_search_indexes::Migration),
        ]
    }
}
