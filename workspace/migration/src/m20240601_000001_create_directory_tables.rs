use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create states table
        manager
            .create_table(
                Table::create()
                    .table(States::Table)
                    .if_not_exists()
                    .col(pk_auto(States::Id))
                    .col(string(States::Name).unique_key())
                    .to_owned(),
            )
            .await?;

        // Create dialysis_centers table
        manager
            .create_table(
                Table::create()
                    .table(DialysisCenters::Table)
                    .if_not_exists()
                    .col(string(DialysisCenters::Id).primary_key())
                    .col(string(DialysisCenters::Slug).unique_key())
                    .col(string(DialysisCenters::Name))
                    .col(string(DialysisCenters::Address))
                    .col(string(DialysisCenters::Town))
                    .col(string_null(DialysisCenters::Sector))
                    .col(string_null(DialysisCenters::Tel))
                    .col(string_null(DialysisCenters::Phone))
                    .col(string_null(DialysisCenters::Email))
                    .col(string_null(DialysisCenters::Website))
                    .col(string_null(DialysisCenters::DoctorInCharge))
                    .col(text_null(DialysisCenters::Services))
                    .col(double_null(DialysisCenters::Latitude))
                    .col(double_null(DialysisCenters::Longitude))
                    .col(boolean(DialysisCenters::Featured).default(false))
                    .col(integer(DialysisCenters::StateId))
                    .col(timestamp_with_time_zone(DialysisCenters::CreatedAt))
                    .col(timestamp_with_time_zone(DialysisCenters::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_dialysis_centers_state")
                            .from(DialysisCenters::Table, DialysisCenters::StateId)
                            .to(States::Table, States::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_dialysis_centers_state_town")
                    .table(DialysisCenters::Table)
                    .col(DialysisCenters::StateId)
                    .col(DialysisCenters::Town)
                    .to_owned(),
            )
            .await?;

        // Create center_images table
        manager
            .create_table(
                Table::create()
                    .table(CenterImages::Table)
                    .if_not_exists()
                    .col(string(CenterImages::Id).primary_key())
                    .col(string(CenterImages::CenterId))
                    .col(string(CenterImages::StorageKey))
                    .col(integer(CenterImages::DisplayOrder))
                    .col(boolean(CenterImages::IsActive).default(true))
                    .col(timestamp_with_time_zone(CenterImages::CreatedAt))
                    .col(timestamp_with_time_zone(CenterImages::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_center_images_center")
                            .from(CenterImages::Table, CenterImages::CenterId)
                            .to(DialysisCenters::Table, DialysisCenters::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_center_images_center_order")
                    .table(CenterImages::Table)
                    .col(CenterImages::CenterId)
                    .col(CenterImages::DisplayOrder)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CenterImages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DialysisCenters::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(States::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum States {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
pub(crate) enum DialysisCenters {
    Table,
    Id,
    Slug,
    Name,
    Address,
    Town,
    Sector,
    Tel,
    Phone,
    Email,
    Website,
    DoctorInCharge,
    Services,
    Latitude,
    Longitude,
    Featured,
    StateId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CenterImages {
    Table,
    Id,
    CenterId,
    StorageKey,
    DisplayOrder,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
