//! Allocation coordinator
//!
//! The only writer of spot status, lot counters and reservation state.
//! Every mutating call runs inside the target spot's exclusive section and
//! commits exactly one change set.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use super::{LotAggregate, ReservationLedger, SpotRegistry};
use crate::application::events::{
    Event, LotCreatedEvent, LotStatusChangedEvent, ReservationCreatedEvent,
    ReservationStatusChangedEvent, SharedEventBus, SpotStatusChangedEvent,
};
use crate::config::AllocationConfig;
use crate::domain::{
    Applied, ChangeSet, DomainError, DomainResult, LotStatus, NewParkingLot, ParkingLot,
    ParkingSpot, ParkingStore, Reservation, ReservationRequest, ReservationStatus,
    ReservationWrite, SpotStatus,
};

fn record<T>(operation: &'static str, result: &DomainResult<T>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    metrics::counter!("parking_allocations_total", "operation" => operation, "outcome" => outcome)
        .increment(1);

    match result {
        Err(e @ DomainError::Storage(_)) => warn!(operation, error = %e, "Allocation failed"),
        Err(e) => debug!(operation, error = %e, "Allocation rejected"),
        Ok(_) => {}
    }
}

pub struct AllocationCoordinator {
    store: Arc<dyn ParkingStore>,
    spots: SpotRegistry,
    lots: LotAggregate,
    ledger: ReservationLedger,
    events: SharedEventBus,
    sections: DashMap<i32, Arc<Mutex<()>>>,
    lock_wait: Duration,
}

impl AllocationCoordinator {
    pub fn new(
        store: Arc<dyn ParkingStore>,
        config: &AllocationConfig,
        events: SharedEventBus,
    ) -> Self {
        Self {
            spots: SpotRegistry::new(store.clone()),
            lots: LotAggregate::new(store.clone()),
            ledger: ReservationLedger::new(store.clone(), config),
            store,
            events,
            sections: DashMap::new(),
            lock_wait: config.lock_wait(),
        }
    }

    pub fn spots(&self) -> &SpotRegistry {
        &self.spots
    }

    pub fn lots(&self) -> &LotAggregate {
        &self.lots
    }

    pub fn ledger(&self) -> &ReservationLedger {
        &self.ledger
    }

    pub fn events(&self) -> &SharedEventBus {
        &self.events
    }

    /// Enter the spot's exclusive section, waiting at most `lock_wait`.
    async fn exclusive(&self, spot_id: i32) -> DomainResult<OwnedMutexGuard<()>> {
        let section = self
            .sections
            .entry(spot_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        tokio::time::timeout(self.lock_wait, section.lock_owned())
            .await
            .map_err(|_| {
                DomainError::StateConflict(format!(
                    "spot {} is busy, gave up after {} ms",
                    spot_id,
                    self.lock_wait.as_millis()
                ))
            })
    }

    // ── Lots ───────────────────────────────────────────────────

    pub async fn create_lot(&self, lot: NewParkingLot) -> DomainResult<ParkingLot> {
        let result = self.lots.create_lot(lot, Utc::now()).await.map(|(lot, _)| lot);
        record("create_lot", &result);

        let lot = result?;
        self.events.publish(Event::LotCreated(LotCreatedEvent {
            lot_id: lot.id,
            name: lot.name.clone(),
            total_spots: lot.total_spots,
            timestamp: lot.created_at,
        }));
        Ok(lot)
    }

    pub async fn set_lot_status(&self, lot_id: i32, status: LotStatus) -> DomainResult<ParkingLot> {
        let result: DomainResult<(LotStatus, ParkingLot)> = async {
            let before = self.lots.get_lot(lot_id).await?;
            let after = self.lots.set_status(lot_id, status, Utc::now()).await?;
            Ok((before.status, after))
        }
        .await;
        record("set_lot_status", &result);

        let (from, lot) = result?;
        if from != lot.status {
            info!(lot_id, from = %from, to = %lot.status, "Lot status overridden");
            self.publish_lot_status(&lot, from);
        }
        Ok(lot)
    }

    // ── Spots ──────────────────────────────────────────────────

    /// Manual override; the lot counter is recounted rather than adjusted.
    pub async fn update_spot_status(&self, spot_id: i32, status: SpotStatus) -> DomainResult<ParkingSpot> {
        let result = self
            .spot_move(spot_id, |spots, spot, at| {
                Ok(spots.set_status(spot, status, at)?.recount())
            })
            .await;
        record("update_spot_status", &result);
        Ok(result?.spot)
    }

    pub async fn simulate_car_entry(&self, spot_id: i32) -> DomainResult<bool> {
        let result = self
            .spot_move(spot_id, |spots, spot, at| {
                if spot.status == SpotStatus::Occupied {
                    return Err(DomainError::StateConflict(format!(
                        "spot {} is already occupied",
                        spot.id
                    )));
                }
                spots.set_status(spot, SpotStatus::Occupied, at)
            })
            .await;
        record("simulate_car_entry", &result);
        result.map(|_| true)
    }

    pub async fn simulate_car_exit(&self, spot_id: i32) -> DomainResult<bool> {
        let result = self
            .spot_move(spot_id, |spots, spot, at| {
                if spot.status == SpotStatus::Available {
                    return Err(DomainError::StateConflict(format!(
                        "spot {} is already available",
                        spot.id
                    )));
                }
                spots.set_status(spot, SpotStatus::Available, at)
            })
            .await;
        record("simulate_car_exit", &result);
        result.map(|_| true)
    }

    async fn spot_move<F>(&self, spot_id: i32, prepare: F) -> DomainResult<Applied>
    where
        F: FnOnce(&SpotRegistry, &ParkingSpot, DateTime<Utc>) -> DomainResult<ChangeSet>,
    {
        self.spots.get_spot(spot_id).await?;
        let _section = self.exclusive(spot_id).await?;

        let spot = self.spots.get_spot(spot_id).await?;
        let now = Utc::now();
        let change = prepare(&self.spots, &spot, now)?;
        let change = self.ledger.settle_on_release(change, now).await?;
        let settled_from = match &change.reservation {
            ReservationWrite::Update { expected, .. } => Some(*expected),
            _ => None,
        };
        let applied = self.store.apply(change).await?;

        info!(
            spot_id,
            lot_id = applied.lot.id,
            from = %applied.previous_spot_status,
            to = %applied.spot.status,
            available_spots = applied.lot.available_spots,
            "Spot status changed"
        );
        match settled_from {
            Some(from) => {
                self.finish_reservation_move(&applied, from)?;
            }
            None => self.publish_applied(&applied),
        }
        Ok(applied)
    }

    // ── Reservations ───────────────────────────────────────────

    pub async fn create_reservation(&self, request: ReservationRequest) -> DomainResult<Reservation> {
        let result = self.try_create_reservation(request).await;
        record("create_reservation", &result);
        result
    }

    async fn try_create_reservation(&self, request: ReservationRequest) -> DomainResult<Reservation> {
        self.spots.get_spot(request.spot_id).await?;
        let _section = self.exclusive(request.spot_id).await?;

        let spot = self.spots.get_spot(request.spot_id).await?;
        let lot = self.lots.get_lot(spot.lot_id).await?;
        let change = self
            .ledger
            .prepare_create(&request, &spot, &lot, Utc::now())
            .await?;
        let applied = self.store.apply(change).await?;
        let reservation = applied.reservation.clone().ok_or_else(|| {
            DomainError::Storage(format!("no reservation returned for spot {}", spot.id))
        })?;

        info!(
            reservation_id = reservation.id,
            spot_id = spot.id,
            lot_id = lot.id,
            duration_hours = reservation.duration_hours,
            total_amount = %reservation.total_amount,
            "Spot reserved"
        );
        self.publish_applied(&applied);
        self.events.publish(Event::ReservationCreated(ReservationCreatedEvent {
            reservation_id: reservation.id,
            spot_id: reservation.spot_id,
            lot_id: reservation.lot_id,
            status: reservation.status,
            start_time: reservation.start_time,
            end_time: reservation.end_time,
            timestamp: reservation.created_at,
        }));
        Ok(reservation)
    }

    pub async fn cancel_reservation(&self, id: i32) -> DomainResult<bool> {
        let result = self
            .reservation_move(id, |ledger, r, spot, at| ledger.prepare_cancel(r, spot, at))
            .await;
        record("cancel_reservation", &result);
        result.map(|_| true)
    }

    pub async fn confirm_reservation(&self, id: i32) -> DomainResult<Reservation> {
        let result = self
            .reservation_move(id, |ledger, r, spot, at| ledger.prepare_confirm(r, spot, at))
            .await;
        record("confirm_reservation", &result);
        result
    }

    pub async fn check_in(&self, id: i32) -> DomainResult<Reservation> {
        let result = self
            .reservation_move(id, |ledger, r, spot, at| ledger.prepare_check_in(r, spot, at))
            .await;
        record("check_in", &result);
        result
    }

    pub async fn check_out(&self, id: i32) -> DomainResult<Reservation> {
        let result = self
            .reservation_move(id, |ledger, r, spot, at| ledger.prepare_check_out(r, spot, at))
            .await;
        record("check_out", &result);
        result
    }

    /// Expire every overdue reservation as of `now`.
    pub async fn expire_reservations(&self, now: DateTime<Utc>) -> DomainResult<Vec<Reservation>> {
        let result = self.try_expire_reservations(now).await;
        record("expire_reservations", &result);
        result
    }

    async fn try_expire_reservations(&self, now: DateTime<Utc>) -> DomainResult<Vec<Reservation>> {
        let candidates = self.ledger.find_expired(now).await?;
        let mut expired = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let _section = self.exclusive(candidate.spot_id).await?;
            let reservation = self.ledger.get(candidate.id).await?;
            if !reservation.is_overdue(now) {
                continue;
            }
            let from = reservation.status;
            let spot = self.spots.get_spot(reservation.spot_id).await?;
            let change = self.ledger.prepare_expire(reservation, &spot, now)?;
            let applied = self.store.apply(change).await?;
            let reservation = self.finish_reservation_move(&applied, from)?;
            expired.push(reservation);
        }

        if !expired.is_empty() {
            info!(count = expired.len(), "Expired overdue reservations");
        }
        Ok(expired)
    }

    async fn reservation_move<F>(&self, id: i32, prepare: F) -> DomainResult<Reservation>
    where
        F: FnOnce(&ReservationLedger, Reservation, &ParkingSpot, DateTime<Utc>) -> DomainResult<ChangeSet>,
    {
        let spot_id = self.ledger.get(id).await?.spot_id;
        let _section = self.exclusive(spot_id).await?;

        let reservation = self.ledger.get(id).await?;
        let from = reservation.status;
        let spot = self.spots.get_spot(reservation.spot_id).await?;
        let change = prepare(&self.ledger, reservation, &spot, Utc::now())?;
        let applied = self.store.apply(change).await?;
        self.finish_reservation_move(&applied, from)
    }

    fn finish_reservation_move(
        &self,
        applied: &Applied,
        from: ReservationStatus,
    ) -> DomainResult<Reservation> {
        let reservation = applied.reservation.clone().ok_or_else(|| {
            DomainError::Storage(format!(
                "no reservation returned for spot {}",
                applied.spot.id
            ))
        })?;

        info!(
            reservation_id = reservation.id,
            spot_id = reservation.spot_id,
            from = %from,
            to = %reservation.status,
            "Reservation updated"
        );
        self.publish_applied(applied);
        self.events
            .publish(Event::ReservationStatusChanged(ReservationStatusChangedEvent {
                reservation_id: reservation.id,
                spot_id: reservation.spot_id,
                lot_id: reservation.lot_id,
                from,
                to: reservation.status,
                timestamp: reservation.updated_at,
            }));
        Ok(reservation)
    }

    // ── Events ─────────────────────────────────────────────────

    fn publish_applied(&self, applied: &Applied) {
        if applied.previous_spot_status != applied.spot.status {
            self.events.publish(Event::SpotStatusChanged(SpotStatusChangedEvent {
                spot_id: applied.spot.id,
                lot_id: applied.spot.lot_id,
                from: applied.previous_spot_status,
                to: applied.spot.status,
                available_spots: applied.lot.available_spots,
                timestamp: applied.spot.updated_at,
            }));
        }
        if let Some(from) = applied.previous_lot_status {
            info!(lot_id = applied.lot.id, from = %from, to = %applied.lot.status, "Lot status derived");
            self.publish_lot_status(&applied.lot, from);
        }
    }

    fn publish_lot_status(&self, lot: &ParkingLot, from: LotStatus) {
        self.events.publish(Event::LotStatusChanged(LotStatusChangedEvent {
            lot_id: lot.id,
            from,
            to: lot.status,
            available_spots: lot.available_spots,
            timestamp: lot.updated_at,
        }));
    }
}
