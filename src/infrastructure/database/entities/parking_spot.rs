//! Parking spot entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parking_spots")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub parking_lot_id: i32,
    pub spot_number: String,

    /// AVAILABLE, RESERVED, OCCUPIED, MAINTENANCE
    pub status: String,
    pub spot_type: String,
    pub floor_number: i32,

    #[sea_orm(nullable)]
    pub section: Option<String>,

    pub is_accessible: bool,
    pub is_covered: bool,
    pub is_electric_charging: bool,

    #[sea_orm(nullable)]
    pub last_occupied_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::parking_lot::Entity",
        from = "Column::ParkingLotId",
        to = "super::parking_lot::Column::Id"
    )]
    ParkingLot,
    #[sea_orm(has_many = "super::reservation::Entity")]
    Reservation,
}

impl Related<super::parking_lot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ParkingLot.def()
    }
}

impl Related<super::reservation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reservation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
