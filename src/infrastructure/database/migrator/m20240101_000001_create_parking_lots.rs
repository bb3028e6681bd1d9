//! Create parking_lots table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ParkingLots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ParkingLots::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ParkingLots::Name).string_len(100).not_null())
                    .col(ColumnDef::new(ParkingLots::Address).string().not_null())
                    .col(ColumnDef::new(ParkingLots::City).string_len(100).not_null())
                    .col(ColumnDef::new(ParkingLots::Latitude).double().not_null().default(0.0))
                    .col(ColumnDef::new(ParkingLots::Longitude).double().not_null().default(0.0))
                    .col(ColumnDef::new(ParkingLots::TotalSpots).integer().not_null())
                    .col(ColumnDef::new(ParkingLots::AvailableSpots).integer().not_null())
                    .col(
                        ColumnDef::new(ParkingLots::Status)
                            .string()
                            .not_null()
                            .default("ACTIVE"),
                    )
                    .col(
                        ColumnDef::new(ParkingLots::HourlyRateCents)
                            .big_integer()
                            .not_null()
                            .default(1000),
                    )
                    .col(
                        ColumnDef::new(ParkingLots::OpeningTime)
                            .string_len(5)
                            .not_null()
                            .default("00:00"),
                    )
                    .col(
                        ColumnDef::new(ParkingLots::ClosingTime)
                            .string_len(5)
                            .not_null()
                            .default("23:59"),
                    )
                    .col(
                        ColumnDef::new(ParkingLots::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingLots::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parking_lots_status")
                    .table(ParkingLots::Table)
                    .col(ParkingLots::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ParkingLots::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ParkingLots {
    Table,
    Id,
    Name,
    Address,
    City,
    Latitude,
    Longitude,
    TotalSpots,
    AvailableSpots,
    Status,
    HourlyRateCents,
    OpeningTime,
    ClosingTime,
    CreatedAt,
    UpdatedAt,
}
