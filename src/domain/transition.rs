//! Change sets committed by a `ParkingStore`
//!
//! A change set is everything one allocation call writes: the spot's new
//! status, the lot counter adjustment, and an optional reservation write.
//! Each carries the prior state it was computed from so the store can reject
//! a commit that lost a race.

use chrono::{DateTime, Utc};

use crate::domain::lot::{CounterAdjustment, LotStatus, ParkingLot};
use crate::domain::reservation::{NewReservation, Reservation, ReservationStatus};
use crate::domain::spot::{ParkingSpot, SpotStatus};
use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq)]
pub enum ReservationWrite {
    None,
    /// Fails with `SpotUnavailable` if the spot already has an active reservation
    Insert(NewReservation),
    /// Fails with `StateConflict` unless the stored status is still `expected`
    Update {
        reservation: Reservation,
        expected: ReservationStatus,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet {
    pub spot_id: i32,
    /// Status the spot must still hold at commit
    pub expected: SpotStatus,
    /// `None` leaves the spot untouched
    pub next: Option<SpotStatus>,
    pub counter: CounterAdjustment,
    pub reservation: ReservationWrite,
    pub at: DateTime<Utc>,
}

impl ChangeSet {
    /// Move `spot` to `next`. Illegal transitions are rejected here, before
    /// anything reaches the store.
    pub fn transition(spot: &ParkingSpot, next: SpotStatus, at: DateTime<Utc>) -> DomainResult<Self> {
        if !spot.status.can_transition_to(next) {
            return Err(DomainError::StateConflict(format!(
                "spot {} cannot move from {} to {}",
                spot.id, spot.status, next
            )));
        }
        Ok(Self {
            spot_id: spot.id,
            expected: spot.status,
            next: Some(next),
            counter: CounterAdjustment::for_transition(spot.status, next),
            reservation: ReservationWrite::None,
            at,
        })
    }

    /// Guard on the spot's current status without changing it.
    pub fn hold(spot: &ParkingSpot, at: DateTime<Utc>) -> Self {
        Self {
            spot_id: spot.id,
            expected: spot.status,
            next: None,
            counter: CounterAdjustment::Unchanged,
            reservation: ReservationWrite::None,
            at,
        }
    }

    pub fn recount(mut self) -> Self {
        self.counter = CounterAdjustment::Recount;
        self
    }

    pub fn with_reservation(mut self, write: ReservationWrite) -> Self {
        self.reservation = write;
        self
    }

    /// Check the guard and write the new status onto a stored spot.
    pub fn apply_to_spot(&self, spot: &mut ParkingSpot) -> DomainResult<()> {
        if spot.status != self.expected {
            return Err(DomainError::StateConflict(format!(
                "spot {} changed concurrently: expected {}, found {}",
                spot.id, self.expected, spot.status
            )));
        }
        if let Some(next) = self.next {
            spot.status = next;
            if next == SpotStatus::Occupied {
                spot.last_occupied_at = Some(self.at);
            }
            spot.updated_at = self.at;
        }
        Ok(())
    }

    /// Settle the lot counter. `literal_available` is required for `Recount`.
    pub fn settle_lot(
        &self,
        lot: &mut ParkingLot,
        literal_available: Option<u32>,
    ) -> Option<LotStatus> {
        match (self.counter, literal_available) {
            (CounterAdjustment::Recount, Some(count)) => lot.settle_available(count, self.at),
            (CounterAdjustment::Recount, None) => None,
            (adjustment, _) => lot.adjust(adjustment, self.at),
        }
    }
}

/// Guard check shared by stores for `ReservationWrite::Update`.
pub fn check_reservation_guard(
    stored: &Reservation,
    expected: ReservationStatus,
) -> DomainResult<()> {
    if stored.status != expected {
        return Err(DomainError::StateConflict(format!(
            "reservation {} changed concurrently: expected {}, found {}",
            stored.id, expected, stored.status
        )));
    }
    Ok(())
}

/// What a committed change set produced
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub spot: ParkingSpot,
    pub previous_spot_status: SpotStatus,
    pub lot: ParkingLot,
    /// Set when the lot flipped between ACTIVE and FULL
    pub previous_lot_status: Option<LotStatus>,
    pub reservation: Option<Reservation>,
}
