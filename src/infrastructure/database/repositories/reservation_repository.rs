//! SeaORM implementation of ReservationRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use super::convert::{collect, from_cents, reservation_to_domain};
use crate::domain::reservation::{Reservation, ReservationRepository, ReservationStatus};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::reservation;

pub(super) const ACTIVE_STATUSES: [&str; 2] = ["PENDING", "CONFIRMED"];

pub struct SeaOrmReservationRepository {
    db: DatabaseConnection,
}

impl SeaOrmReservationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReservationRepository for SeaOrmReservationRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Reservation>> {
        reservation::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(reservation_to_domain)
            .transpose()
    }

    async fn find_by_lot(&self, lot_id: i32) -> DomainResult<Vec<Reservation>> {
        let rows = reservation::Entity::find()
            .filter(reservation::Column::ParkingLotId.eq(lot_id))
            .order_by_asc(reservation::Column::Id)
            .all(&self.db)
            .await?;
        collect(rows, reservation_to_domain)
    }

    async fn find_active_by_user_email(&self, email: &str) -> DomainResult<Vec<Reservation>> {
        let rows = reservation::Entity::find()
            .filter(reservation::Column::UserEmail.eq(email))
            .filter(reservation::Column::Status.is_in(ACTIVE_STATUSES))
            .order_by_desc(reservation::Column::StartTime)
            .order_by_desc(reservation::Column::Id)
            .all(&self.db)
            .await?;
        collect(rows, reservation_to_domain)
    }

    async fn find_active_for_spot(&self, spot_id: i32) -> DomainResult<Option<Reservation>> {
        reservation::Entity::find()
            .filter(reservation::Column::ParkingSpotId.eq(spot_id))
            .filter(reservation::Column::Status.is_in(ACTIVE_STATUSES))
            .one(&self.db)
            .await?
            .map(reservation_to_domain)
            .transpose()
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> DomainResult<Vec<Reservation>> {
        let rows = reservation::Entity::find()
            .filter(reservation::Column::Status.is_in(ACTIVE_STATUSES))
            .filter(reservation::Column::CheckInTime.is_null())
            .filter(reservation::Column::EndTime.lt(now))
            .order_by_asc(reservation::Column::Id)
            .all(&self.db)
            .await?;
        collect(rows, reservation_to_domain)
    }

    async fn total_revenue_by_lot(&self, lot_id: i32) -> DomainResult<Decimal> {
        let rows = reservation::Entity::find()
            .filter(reservation::Column::ParkingLotId.eq(lot_id))
            .filter(reservation::Column::Status.eq(ReservationStatus::Completed.as_str()))
            .all(&self.db)
            .await?;
        Ok(from_cents(rows.iter().map(|r| r.total_amount_cents).sum()))
    }
}
