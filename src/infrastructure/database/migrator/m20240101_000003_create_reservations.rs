//! Create reservations table
//!
//! Stores spot reservations with their booking window, amount and
//! lifecycle timestamps.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_parking_lots::ParkingLots;
use super::m20240101_000002_create_parking_spots::ParkingSpots;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reservations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reservations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reservations::ParkingSpotId).integer().not_null())
                    .col(ColumnDef::new(Reservations::ParkingLotId).integer().not_null())
                    .col(ColumnDef::new(Reservations::UserName).string_len(100).not_null())
                    .col(ColumnDef::new(Reservations::UserEmail).string().not_null())
                    .col(ColumnDef::new(Reservations::UserPhone).string_len(20).not_null())
                    .col(ColumnDef::new(Reservations::LicensePlate).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Reservations::StartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reservations::EndTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reservations::DurationHours).integer().not_null())
                    .col(
                        ColumnDef::new(Reservations::Status)
                            .string()
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(
                        ColumnDef::new(Reservations::TotalAmountCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reservations::PaymentStatus)
                            .string()
                            .not_null()
                            .default("UNPAID"),
                    )
                    .col(ColumnDef::new(Reservations::CheckInTime).timestamp_with_time_zone())
                    .col(ColumnDef::new(Reservations::CheckOutTime).timestamp_with_time_zone())
                    .col(ColumnDef::new(Reservations::CancellationReason).string())
                    .col(ColumnDef::new(Reservations::CancelledAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Reservations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reservations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservations_spot")
                            .from(Reservations::Table, Reservations::ParkingSpotId)
                            .to(ParkingSpots::Table, ParkingSpots::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservations_lot")
                            .from(Reservations::Table, Reservations::ParkingLotId)
                            .to(ParkingLots::Table, ParkingLots::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_reservations_user_email", Reservations::UserEmail),
            ("idx_reservations_status", Reservations::Status),
            ("idx_reservations_lot", Reservations::ParkingLotId),
            ("idx_reservations_spot", Reservations::ParkingSpotId),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Reservations::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reservations::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Reservations {
    Table,
    Id,
    ParkingSpotId,
    ParkingLotId,
    UserName,
    UserEmail,
    UserPhone,
    LicensePlate,
    StartTime,
    EndTime,
    DurationHours,
    Status,
    TotalAmountCents,
    PaymentStatus,
    CheckInTime,
    CheckOutTime,
    CancellationReason,
    CancelledAt,
    CreatedAt,
    UpdatedAt,
}
