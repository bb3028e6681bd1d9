//! Create parking_spots table
//!
//! Spot numbers are unique within a lot.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_parking_lots::ParkingLots;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ParkingSpots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ParkingSpots::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ParkingSpots::ParkingLotId).integer().not_null())
                    .col(ColumnDef::new(ParkingSpots::SpotNumber).string_len(20).not_null())
                    .col(
                        ColumnDef::new(ParkingSpots::Status)
                            .string()
                            .not_null()
                            .default("AVAILABLE"),
                    )
                    .col(
                        ColumnDef::new(ParkingSpots::SpotType)
                            .string()
                            .not_null()
                            .default("STANDARD"),
                    )
                    .col(
                        ColumnDef::new(ParkingSpots::FloorNumber)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(ParkingSpots::Section).string_len(10))
                    .col(
                        ColumnDef::new(ParkingSpots::IsAccessible)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ParkingSpots::IsCovered)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ParkingSpots::IsElectricCharging)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(ParkingSpots::LastOccupiedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(ParkingSpots::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingSpots::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_parking_spots_lot")
                            .from(ParkingSpots::Table, ParkingSpots::ParkingLotId)
                            .to(ParkingLots::Table, ParkingLots::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parking_spots_lot_number")
                    .table(ParkingSpots::Table)
                    .col(ParkingSpots::ParkingLotId)
                    .col(ParkingSpots::SpotNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parking_spots_status")
                    .table(ParkingSpots::Table)
                    .col(ParkingSpots::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ParkingSpots::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ParkingSpots {
    Table,
    Id,
    ParkingLotId,
    SpotNumber,
    Status,
    SpotType,
    FloorNumber,
    Section,
    IsAccessible,
    IsCovered,
    IsElectricCharging,
    LastOccupiedAt,
    CreatedAt,
    UpdatedAt,
}
