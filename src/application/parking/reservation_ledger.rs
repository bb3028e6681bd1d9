//! Reservation bookkeeping
//!
//! The `prepare_*` methods check a reservation move against the current
//! spot and lot and return the change set for it. They never write.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use validator::Validate;

use crate::config::AllocationConfig;
use crate::domain::{
    ChangeSet, DomainError, DomainResult, NewReservation, ParkingLot, ParkingSpot, ParkingStore,
    Reservation, ReservationRequest, ReservationStatus, ReservationWrite, SpotStatus,
};

/// Recorded on reservations cancelled because their spot was released
pub const RELEASE_REASON: &str = "Spot released";

#[derive(Clone)]
pub struct ReservationLedger {
    store: Arc<dyn ParkingStore>,
    auto_confirm: bool,
    cancellation_reason: String,
}

impl ReservationLedger {
    pub fn new(store: Arc<dyn ParkingStore>, config: &AllocationConfig) -> Self {
        Self {
            store,
            auto_confirm: config.auto_confirm,
            cancellation_reason: config.cancellation_reason.clone(),
        }
    }

    pub async fn get(&self, id: i32) -> DomainResult<Reservation> {
        self.store
            .reservations()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Reservation", id))
    }

    pub async fn by_user_email(&self, email: &str) -> DomainResult<Vec<Reservation>> {
        self.store
            .reservations()
            .find_active_by_user_email(&email.trim().to_lowercase())
            .await
    }

    pub async fn by_lot(&self, lot_id: i32) -> DomainResult<Vec<Reservation>> {
        self.store.reservations().find_by_lot(lot_id).await
    }

    pub async fn total_revenue(&self, lot_id: i32) -> DomainResult<Decimal> {
        self.store.reservations().total_revenue_by_lot(lot_id).await
    }

    pub async fn find_expired(&self, now: DateTime<Utc>) -> DomainResult<Vec<Reservation>> {
        self.store.reservations().find_expired(now).await
    }

    /// New reservation on an AVAILABLE spot with no active claim.
    pub async fn prepare_create(
        &self,
        request: &ReservationRequest,
        spot: &ParkingSpot,
        lot: &ParkingLot,
        at: DateTime<Utc>,
    ) -> DomainResult<ChangeSet> {
        request.validate()?;
        let window = request.window()?;

        if spot.status != SpotStatus::Available {
            return Err(DomainError::SpotUnavailable(spot.id));
        }
        if self
            .store
            .reservations()
            .find_active_for_spot(spot.id)
            .await?
            .is_some()
        {
            return Err(DomainError::SpotUnavailable(spot.id));
        }

        let status = if self.auto_confirm {
            ReservationStatus::Confirmed
        } else {
            ReservationStatus::Pending
        };
        let reservation = NewReservation {
            spot_id: spot.id,
            lot_id: lot.id,
            user_name: request.user_name.trim().to_string(),
            user_email: request.user_email.trim().to_lowercase(),
            user_phone: request.user_phone.trim().to_string(),
            license_plate: request.license_plate.trim().to_uppercase(),
            total_amount: lot.hourly_rate * Decimal::from(window.duration_hours),
            window,
            status,
            created_at: at,
        };

        Ok(ChangeSet::transition(spot, SpotStatus::Reserved, at)?
            .with_reservation(ReservationWrite::Insert(reservation)))
    }

    /// Cancel and hand the spot back. A spot under MAINTENANCE keeps its status.
    pub fn prepare_cancel(
        &self,
        mut reservation: Reservation,
        spot: &ParkingSpot,
        at: DateTime<Utc>,
    ) -> DomainResult<ChangeSet> {
        let expected = reservation.status;
        reservation.cancel(self.cancellation_reason.clone(), at)?;
        let change = match spot.status {
            SpotStatus::Reserved | SpotStatus::Occupied => {
                ChangeSet::transition(spot, SpotStatus::Available, at)?
            }
            SpotStatus::Available | SpotStatus::Maintenance => ChangeSet::hold(spot, at),
        };
        Ok(change.with_reservation(ReservationWrite::Update {
            reservation,
            expected,
        }))
    }

    pub fn prepare_confirm(
        &self,
        mut reservation: Reservation,
        spot: &ParkingSpot,
        at: DateTime<Utc>,
    ) -> DomainResult<ChangeSet> {
        let expected = reservation.status;
        reservation.confirm(at)?;
        Ok(ChangeSet::hold(spot, at).with_reservation(ReservationWrite::Update {
            reservation,
            expected,
        }))
    }

    /// Driver arrives: the held spot becomes OCCUPIED.
    pub fn prepare_check_in(
        &self,
        mut reservation: Reservation,
        spot: &ParkingSpot,
        at: DateTime<Utc>,
    ) -> DomainResult<ChangeSet> {
        if spot.status != SpotStatus::Reserved {
            return Err(DomainError::StateConflict(format!(
                "spot {} is {}, expected RESERVED for check-in",
                spot.id, spot.status
            )));
        }
        let expected = reservation.status;
        reservation.check_in(at)?;
        Ok(ChangeSet::transition(spot, SpotStatus::Occupied, at)?
            .with_reservation(ReservationWrite::Update {
                reservation,
                expected,
            }))
    }

    /// Driver leaves: reservation COMPLETED, spot AVAILABLE again.
    pub fn prepare_check_out(
        &self,
        mut reservation: Reservation,
        spot: &ParkingSpot,
        at: DateTime<Utc>,
    ) -> DomainResult<ChangeSet> {
        if spot.status != SpotStatus::Occupied {
            return Err(DomainError::StateConflict(format!(
                "spot {} is {}, expected OCCUPIED for check-out",
                spot.id, spot.status
            )));
        }
        let expected = reservation.status;
        reservation.complete(at)?;
        Ok(ChangeSet::transition(spot, SpotStatus::Available, at)?
            .with_reservation(ReservationWrite::Update {
                reservation,
                expected,
            }))
    }

    /// Overdue reservation becomes EXPIRED; a spot it still holds is released.
    pub fn prepare_expire(
        &self,
        mut reservation: Reservation,
        spot: &ParkingSpot,
        now: DateTime<Utc>,
    ) -> DomainResult<ChangeSet> {
        let expected = reservation.status;
        reservation.expire(now)?;
        let change = if spot.status == SpotStatus::Reserved {
            ChangeSet::transition(spot, SpotStatus::Available, now)?
        } else {
            ChangeSet::hold(spot, now)
        };
        Ok(change.with_reservation(ReservationWrite::Update {
            reservation,
            expected,
        }))
    }

    /// A spot leaving RESERVED or OCCUPIED by exit or manual override takes
    /// its reservation along: completed after check-in, cancelled otherwise.
    pub async fn settle_on_release(
        &self,
        change: ChangeSet,
        at: DateTime<Utc>,
    ) -> DomainResult<ChangeSet> {
        let releases = matches!(change.expected, SpotStatus::Reserved | SpotStatus::Occupied)
            && matches!(change.next, Some(SpotStatus::Available | SpotStatus::Maintenance));
        if !releases || change.reservation != ReservationWrite::None {
            return Ok(change);
        }

        let Some(mut reservation) = self
            .store
            .reservations()
            .find_active_for_spot(change.spot_id)
            .await?
        else {
            return Ok(change);
        };

        let expected = reservation.status;
        if reservation.has_checked_in() {
            reservation.complete(at)?;
        } else {
            reservation.cancel(RELEASE_REASON, at)?;
        }
        Ok(change.with_reservation(ReservationWrite::Update {
            reservation,
            expected,
        }))
    }
}
