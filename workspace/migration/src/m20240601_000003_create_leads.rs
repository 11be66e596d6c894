use sea_orm_migration::{prelude::*, schema::*};

use crate::m20240601_000001_create_directory_tables::DialysisCenters;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Leads::Table)
                    .if_not_exists()
                    .col(pk_auto(Leads::Id))
                    .col(string(Leads::Name))
                    .col(string(Leads::Phone))
                    .col(string_null(Leads::Email))
                    .col(text_null(Leads::Message))
                    .col(string_null(Leads::CenterId))
                    .col(string(Leads::SourceIp))
                    .col(timestamp_with_time_zone(Leads::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_leads_center")
                            .from(Leads::Table, Leads::CenterId)
                            .to(DialysisCenters::Table, DialysisCenters::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Leads::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Leads {
    Table,
    Id,
    Name,
    Phone,
    Email,
    Message,
    CenterId,
    SourceIp,
    CreatedAt,
}
