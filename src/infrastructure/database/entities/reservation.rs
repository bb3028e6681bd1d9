//! Reservation entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reservations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub parking_spot_id: i32,
    pub parking_lot_id: i32,

    pub user_name: String,
    pub user_email: String,
    pub user_phone: String,
    pub license_plate: String,

    pub start_time: DateTimeUtc,
    pub end_time: DateTimeUtc,
    pub duration_hours: i32,

    /// PENDING, CONFIRMED, CANCELLED, COMPLETED, EXPIRED, NO_SHOW
    pub status: String,

    /// Minor units (cents)
    pub total_amount_cents: i64,
    /// UNPAID, PAID, REFUNDED, PENDING
    pub payment_status: String,

    #[sea_orm(nullable)]
    pub check_in_time: Option<DateTimeUtc>,
    #[sea_orm(nullable)]
    pub check_out_time: Option<DateTimeUtc>,
    #[sea_orm(nullable)]
    pub cancellation_reason: Option<String>,
    #[sea_orm(nullable)]
    pub cancelled_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::parking_spot::Entity",
        from = "Column::ParkingSpotId",
        to = "super::parking_spot::Column::Id"
    )]
    ParkingSpot,
    #[sea_orm(
        belongs_to = "super::parking_lot::Entity",
        from = "Column::ParkingLotId",
        to = "super::parking_lot::Column::Id"
    )]
    ParkingLot,
}

impl Related<super::parking_spot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ParkingSpot.def()
    }
}

impl Related<super::parking_lot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ParkingLot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
