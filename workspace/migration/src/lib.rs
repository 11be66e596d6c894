pub use sea_orm_migration::prelude::*;

mod m20240601_000001_create_directory_tables;
mod m20240601_000002_create_auth_tables;
mod m20240601_000003_create_leads;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_directory_tables::Migration),
            Box::new(m20240601_000002_create_auth_tables::Migration),
            Box::new(m20240601_000003_create_leads::Migration),
        ]
    }
}
