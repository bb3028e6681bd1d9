//! SeaORM implementation of ParkingStore
//!
//! Every write runs in one transaction. Row updates are compare-and-set on
//! the status the change set was computed from, so a lost race surfaces as
//! `StateConflict` and the transaction rolls back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use tokio::sync::Mutex;
use tracing::debug;

use super::convert::{lot_to_domain, reservation_to_domain, spot_to_domain, to_cents, to_i32};
use super::lot_repository::SeaOrmLotRepository;
use super::reservation_repository::{SeaOrmReservationRepository, ACTIVE_STATUSES};
use super::spot_repository::SeaOrmSpotRepository;
use crate::domain::lot::ParkingLotRepository;
use crate::domain::reservation::ReservationRepository;
use crate::domain::spot::ParkingSpotRepository;
use crate::domain::transition::check_reservation_guard;
use crate::domain::{
    Applied, ChangeSet, CounterAdjustment, DomainError, DomainResult, LotStatus, NewParkingLot,
    NewParkingSpot, NewReservation, ParkingLot, ParkingSpot, ParkingStore, Reservation,
    ReservationStatus, ReservationWrite, SpotStatus,
};
use crate::infrastructure::database::entities::{parking_lot, parking_spot, reservation};

/// Database-backed store
pub struct SeaOrmParkingStore {
    db: DatabaseConnection,
    lots: SeaOrmLotRepository,
    spots: SeaOrmSpotRepository,
    reservations: SeaOrmReservationRepository,
    /// SQLite allows one writer; queueing here avoids busy errors mid-transaction
    write_gate: Mutex<()>,
}

impl SeaOrmParkingStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            lots: SeaOrmLotRepository::new(db.clone()),
            spots: SeaOrmSpotRepository::new(db.clone()),
            reservations: SeaOrmReservationRepository::new(db.clone()),
            db,
            write_gate: Mutex::new(()),
        }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn apply_in(&self, txn: &DatabaseTransaction, change: &ChangeSet) -> DomainResult<Applied> {
        let stored = parking_spot::Entity::find_by_id(change.spot_id)
            .one(txn)
            .await?
            .ok_or_else(|| DomainError::not_found("ParkingSpot", change.spot_id))?;
        let mut spot = spot_to_domain(stored)?;
        let previous_spot_status = spot.status;
        change.apply_to_spot(&mut spot)?;

        if change.next.is_some() {
            let result = parking_spot::Entity::update_many()
                .col_expr(parking_spot::Column::Status, Expr::value(spot.status.as_str()))
                .col_expr(parking_spot::Column::LastOccupiedAt, Expr::value(spot.last_occupied_at))
                .col_expr(parking_spot::Column::UpdatedAt, Expr::value(spot.updated_at))
                .filter(parking_spot::Column::Id.eq(spot.id))
                .filter(parking_spot::Column::Status.eq(change.expected.as_str()))
                .exec(txn)
                .await?;
            if result.rows_affected != 1 {
                return Err(lost_race("spot", spot.id));
            }
        }

        let reservation = match &change.reservation {
            ReservationWrite::None => None,
            ReservationWrite::Insert(new) => Some(insert_reservation(txn, new).await?),
            ReservationWrite::Update {
                reservation,
                expected,
            } => {
                update_reservation(txn, reservation, *expected).await?;
                Some(reservation.clone())
            }
        };

        let stored = parking_lot::Entity::find_by_id(spot.lot_id)
            .one(txn)
            .await?
            .ok_or_else(|| DomainError::not_found("ParkingLot", spot.lot_id))?;
        let mut lot = lot_to_domain(stored)?;
        let (old_available, old_status) = (lot.available_spots, lot.status);

        let literal = if change.counter == CounterAdjustment::Recount {
            let count = parking_spot::Entity::find()
                .filter(parking_spot::Column::ParkingLotId.eq(lot.id))
                .filter(parking_spot::Column::Status.eq(SpotStatus::Available.as_str()))
                .count(txn)
                .await?;
            Some(u32::try_from(count).unwrap_or(u32::MAX))
        } else {
            None
        };
        let previous_lot_status = change.settle_lot(&mut lot, literal);

        if lot.available_spots != old_available || lot.status != old_status {
            let result = parking_lot::Entity::update_many()
                .col_expr(
                    parking_lot::Column::AvailableSpots,
                    Expr::value(to_i32(lot.available_spots, "parking_lots.available_spots")?),
                )
                .col_expr(parking_lot::Column::Status, Expr::value(lot.status.as_str()))
                .col_expr(parking_lot::Column::UpdatedAt, Expr::value(lot.updated_at))
                .filter(parking_lot::Column::Id.eq(lot.id))
                .filter(
                    parking_lot::Column::AvailableSpots
                        .eq(to_i32(old_available, "parking_lots.available_spots")?),
                )
                .filter(parking_lot::Column::Status.eq(old_status.as_str()))
                .exec(txn)
                .await?;
            if result.rows_affected != 1 {
                return Err(lost_race("lot", lot.id));
            }
        }

        Ok(Applied {
            spot,
            previous_spot_status,
            lot,
            previous_lot_status,
            reservation,
        })
    }
}

fn lost_race(what: &str, id: i32) -> DomainError {
    DomainError::StateConflict(format!("{} {} changed concurrently", what, id))
}

async fn insert_reservation(
    txn: &DatabaseTransaction,
    new: &NewReservation,
) -> DomainResult<Reservation> {
    let held = reservation::Entity::find()
        .filter(reservation::Column::ParkingSpotId.eq(new.spot_id))
        .filter(reservation::Column::Status.is_in(ACTIVE_STATUSES))
        .count(txn)
        .await?;
    if held > 0 {
        return Err(DomainError::SpotUnavailable(new.spot_id));
    }

    let draft = new.clone().into_reservation(0);
    let model = reservation::ActiveModel {
        id: NotSet,
        parking_spot_id: Set(draft.spot_id),
        parking_lot_id: Set(draft.lot_id),
        user_name: Set(draft.user_name),
        user_email: Set(draft.user_email),
        user_phone: Set(draft.user_phone),
        license_plate: Set(draft.license_plate),
        start_time: Set(draft.start_time),
        end_time: Set(draft.end_time),
        duration_hours: Set(to_i32(draft.duration_hours, "reservations.duration_hours")?),
        status: Set(draft.status.as_str().to_string()),
        total_amount_cents: Set(to_cents(draft.total_amount)?),
        payment_status: Set(draft.payment_status.as_str().to_string()),
        check_in_time: Set(None),
        check_out_time: Set(None),
        cancellation_reason: Set(None),
        cancelled_at: Set(None),
        created_at: Set(draft.created_at),
        updated_at: Set(draft.updated_at),
    };
    reservation_to_domain(model.insert(txn).await?)
}

async fn update_reservation(
    txn: &DatabaseTransaction,
    next: &Reservation,
    expected: ReservationStatus,
) -> DomainResult<()> {
    let stored = reservation::Entity::find_by_id(next.id)
        .one(txn)
        .await?
        .ok_or_else(|| DomainError::not_found("Reservation", next.id))?;
    check_reservation_guard(&reservation_to_domain(stored)?, expected)?;

    let result = reservation::Entity::update_many()
        .col_expr(reservation::Column::Status, Expr::value(next.status.as_str()))
        .col_expr(
            reservation::Column::PaymentStatus,
            Expr::value(next.payment_status.as_str()),
        )
        .col_expr(reservation::Column::CheckInTime, Expr::value(next.check_in_time))
        .col_expr(reservation::Column::CheckOutTime, Expr::value(next.check_out_time))
        .col_expr(
            reservation::Column::CancellationReason,
            Expr::value(next.cancellation_reason.clone()),
        )
        .col_expr(reservation::Column::CancelledAt, Expr::value(next.cancelled_at))
        .col_expr(reservation::Column::UpdatedAt, Expr::value(next.updated_at))
        .filter(reservation::Column::Id.eq(next.id))
        .filter(reservation::Column::Status.eq(expected.as_str()))
        .exec(txn)
        .await?;
    if result.rows_affected != 1 {
        return Err(lost_race("reservation", next.id));
    }
    Ok(())
}

#[async_trait]
impl ParkingStore for SeaOrmParkingStore {
    fn lots(&self) -> &dyn ParkingLotRepository {
        &self.lots
    }

    fn spots(&self) -> &dyn ParkingSpotRepository {
        &self.spots
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        &self.reservations
    }

    async fn create_lot(
        &self,
        lot: NewParkingLot,
        spots: Vec<NewParkingSpot>,
        at: DateTime<Utc>,
    ) -> DomainResult<(ParkingLot, Vec<ParkingSpot>)> {
        if spots.len() != lot.total_spots as usize {
            return Err(DomainError::Validation(format!(
                "lot declares {} spots but {} were supplied",
                lot.total_spots,
                spots.len()
            )));
        }

        let _gate = self.write_gate.lock().await;
        let txn = self.db.begin().await?;

        let draft = lot.into_lot(0, at);
        let inserted = parking_lot::ActiveModel {
            id: NotSet,
            name: Set(draft.name),
            address: Set(draft.address),
            city: Set(draft.city),
            latitude: Set(draft.latitude),
            longitude: Set(draft.longitude),
            total_spots: Set(to_i32(draft.total_spots, "parking_lots.total_spots")?),
            available_spots: Set(to_i32(draft.available_spots, "parking_lots.available_spots")?),
            status: Set(draft.status.as_str().to_string()),
            hourly_rate_cents: Set(to_cents(draft.hourly_rate)?),
            opening_time: Set(draft.opening_time),
            closing_time: Set(draft.closing_time),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await?;
        let lot = lot_to_domain(inserted)?;

        let mut created = Vec::with_capacity(spots.len());
        for spot in spots {
            let draft = spot.into_spot(0, lot.id, at);
            let inserted = parking_spot::ActiveModel {
                id: NotSet,
                parking_lot_id: Set(lot.id),
                spot_number: Set(draft.spot_number),
                status: Set(draft.status.as_str().to_string()),
                spot_type: Set(draft.spot_type.as_str().to_string()),
                floor_number: Set(draft.floor_number),
                section: Set(draft.section),
                is_accessible: Set(draft.is_accessible),
                is_covered: Set(draft.is_covered),
                is_electric_charging: Set(draft.is_electric_charging),
                last_occupied_at: Set(None),
                created_at: Set(at),
                updated_at: Set(at),
            }
            .insert(&txn)
            .await?;
            created.push(spot_to_domain(inserted)?);
        }

        txn.commit().await?;
        debug!(lot_id = lot.id, spots = created.len(), "Lot persisted");
        Ok((lot, created))
    }

    async fn apply(&self, change: ChangeSet) -> DomainResult<Applied> {
        let _gate = self.write_gate.lock().await;
        let txn = self.db.begin().await?;
        match self.apply_in(&txn, &change).await {
            Ok(applied) => {
                txn.commit().await?;
                Ok(applied)
            }
            Err(e) => {
                txn.rollback().await?;
                Err(e)
            }
        }
    }

    async fn set_lot_status(
        &self,
        lot_id: i32,
        status: LotStatus,
        at: DateTime<Utc>,
    ) -> DomainResult<ParkingLot> {
        let _gate = self.write_gate.lock().await;
        let txn = self.db.begin().await?;

        let stored = parking_lot::Entity::find_by_id(lot_id)
            .one(&txn)
            .await?
            .ok_or_else(|| DomainError::not_found("ParkingLot", lot_id))?;
        let mut lot = lot_to_domain(stored.clone())?;
        lot.override_status(status, at)?;

        let mut active: parking_lot::ActiveModel = stored.into();
        active.status = Set(lot.status.as_str().to_string());
        active.updated_at = Set(lot.updated_at);
        active.update(&txn).await?;

        txn.commit().await?;
        Ok(lot)
    }
}
