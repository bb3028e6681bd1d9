//! In-memory storage implementation
//!
//! All tables sit behind one `RwLock`, so every change set and every
//! occupancy read sees a single consistent state.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::domain::lot::ParkingLotRepository;
use crate::domain::reservation::ReservationRepository;
use crate::domain::spot::ParkingSpotRepository;
use crate::domain::transition::check_reservation_guard;
use crate::domain::{
    Applied, ChangeSet, CounterAdjustment, DomainError, DomainResult, LotOccupancy, LotStatus,
    NewParkingLot, NewParkingSpot, ParkingLot, ParkingSpot, ParkingStore, Reservation,
    ReservationStatus, ReservationWrite, SpotStatus,
};

#[derive(Default)]
struct MemoryState {
    lots: BTreeMap<i32, ParkingLot>,
    spots: BTreeMap<i32, ParkingSpot>,
    reservations: BTreeMap<i32, Reservation>,
    last_lot_id: i32,
    last_spot_id: i32,
    last_reservation_id: i32,
}

impl MemoryState {
    fn count_spots(&self, lot_id: i32, status: SpotStatus) -> u64 {
        self.spots
            .values()
            .filter(|s| s.lot_id == lot_id && s.status == status)
            .count() as u64
    }
}

type SharedState = Arc<RwLock<MemoryState>>;

/// In-memory store for development and testing
pub struct InMemoryParkingStore {
    state: SharedState,
    lots: MemoryLotRepository,
    spots: MemorySpotRepository,
    reservations: MemoryReservationRepository,
}

impl InMemoryParkingStore {
    pub fn new() -> Self {
        let state: SharedState = Arc::new(RwLock::new(MemoryState::default()));
        Self {
            lots: MemoryLotRepository {
                state: state.clone(),
            },
            spots: MemorySpotRepository {
                state: state.clone(),
            },
            reservations: MemoryReservationRepository {
                state: state.clone(),
            },
            state,
        }
    }
}

impl Default for InMemoryParkingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ParkingStore for InMemoryParkingStore {
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

        let mut state = self.state.write();
        state.last_lot_id += 1;
        let lot = lot.into_lot(state.last_lot_id, at);

        let mut created = Vec::with_capacity(spots.len());
        for spot in spots {
            state.last_spot_id += 1;
            let spot = spot.into_spot(state.last_spot_id, lot.id, at);
            state.spots.insert(spot.id, spot.clone());
            created.push(spot);
        }
        state.lots.insert(lot.id, lot.clone());

        Ok((lot, created))
    }

    async fn apply(&self, change: ChangeSet) -> DomainResult<Applied> {
        let mut state = self.state.write();

        // Every guard is checked before the first write.
        let mut spot = state
            .spots
            .get(&change.spot_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("ParkingSpot", change.spot_id))?;
        let previous_spot_status = spot.status;
        change.apply_to_spot(&mut spot)?;

        let mut lot = state
            .lots
            .get(&spot.lot_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("ParkingLot", spot.lot_id))?;

        let reservation = match &change.reservation {
            ReservationWrite::None => None,
            ReservationWrite::Insert(new) => {
                let held = state
                    .reservations
                    .values()
                    .any(|r| r.spot_id == new.spot_id && r.is_active());
                if held {
                    return Err(DomainError::SpotUnavailable(new.spot_id));
                }
                Some(new.clone().into_reservation(state.last_reservation_id + 1))
            }
            ReservationWrite::Update {
                reservation,
                expected,
            } => {
                let stored = state
                    .reservations
                    .get(&reservation.id)
                    .ok_or_else(|| DomainError::not_found("Reservation", reservation.id))?;
                check_reservation_guard(stored, *expected)?;
                Some(reservation.clone())
            }
        };

        state.spots.insert(spot.id, spot.clone());
        let literal = (change.counter == CounterAdjustment::Recount).then(|| {
            u32::try_from(state.count_spots(lot.id, SpotStatus::Available)).unwrap_or(u32::MAX)
        });
        let previous_lot_status = change.settle_lot(&mut lot, literal);
        state.lots.insert(lot.id, lot.clone());

        if let Some(r) = &reservation {
            if matches!(change.reservation, ReservationWrite::Insert(_)) {
                state.last_reservation_id = r.id;
            }
            state.reservations.insert(r.id, r.clone());
        }

        Ok(Applied {
            spot,
            previous_spot_status,
            lot,
            previous_lot_status,
            reservation,
        })
    }

    async fn set_lot_status(
        &self,
        lot_id: i32,
        status: LotStatus,
        at: DateTime<Utc>,
    ) -> DomainResult<ParkingLot> {
        let mut state = self.state.write();
        let lot = state
            .lots
            .get_mut(&lot_id)
            .ok_or_else(|| DomainError::not_found("ParkingLot", lot_id))?;
        lot.override_status(status, at)?;
        Ok(lot.clone())
    }
}

// ── Repositories ───────────────────────────────────────────────

pub struct MemoryLotRepository {
    state: SharedState,
}

#[async_trait]
impl ParkingLotRepository for MemoryLotRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<ParkingLot>> {
        Ok(self.state.read().lots.get(&id).cloned())
    }

    async fn find_all(&self) -> DomainResult<Vec<ParkingLot>> {
        Ok(self.state.read().lots.values().cloned().collect())
    }

    async fn find_by_status(&self, status: LotStatus) -> DomainResult<Vec<ParkingLot>> {
        Ok(self
            .state
            .read()
            .lots
            .values()
            .filter(|l| l.status == status)
            .cloned()
            .collect())
    }

    async fn total_available_spots(&self) -> DomainResult<u64> {
        Ok(self
            .state
            .read()
            .lots
            .values()
            .filter(|l| l.status == LotStatus::Active)
            .map(|l| u64::from(l.available_spots))
            .sum())
    }

    async fn occupancy(&self, lot_id: i32) -> DomainResult<Option<LotOccupancy>> {
        let state = self.state.read();
        Ok(state.lots.get(&lot_id).map(|lot| LotOccupancy {
            lot: lot.clone(),
            available: state.count_spots(lot_id, SpotStatus::Available),
            reserved: state.count_spots(lot_id, SpotStatus::Reserved),
            occupied: state.count_spots(lot_id, SpotStatus::Occupied),
            maintenance: state.count_spots(lot_id, SpotStatus::Maintenance),
        }))
    }
}

pub struct MemorySpotRepository {
    state: SharedState,
}

#[async_trait]
impl ParkingSpotRepository for MemorySpotRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<ParkingSpot>> {
        Ok(self.state.read().spots.get(&id).cloned())
    }

    async fn find_by_lot(&self, lot_id: i32) -> DomainResult<Vec<ParkingSpot>> {
        Ok(self
            .state
            .read()
            .spots
            .values()
            .filter(|s| s.lot_id == lot_id)
            .cloned()
            .collect())
    }

    async fn find_by_status(&self, status: SpotStatus) -> DomainResult<Vec<ParkingSpot>> {
        Ok(self
            .state
            .read()
            .spots
            .values()
            .filter(|s| s.status == status)
            .cloned()
            .collect())
    }

    async fn find_by_lot_and_status(
        &self,
        lot_id: i32,
        status: SpotStatus,
    ) -> DomainResult<Vec<ParkingSpot>> {
        Ok(self
            .state
            .read()
            .spots
            .values()
            .filter(|s| s.lot_id == lot_id && s.status == status)
            .cloned()
            .collect())
    }

    async fn count_by_lot_and_status(&self, lot_id: i32, status: SpotStatus) -> DomainResult<u64> {
        Ok(self.state.read().count_spots(lot_id, status))
    }
}

pub struct MemoryReservationRepository {
    state: SharedState,
}

#[async_trait]
impl ReservationRepository for MemoryReservationRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Reservation>> {
        Ok(self.state.read().reservations.get(&id).cloned())
    }

    async fn find_by_lot(&self, lot_id: i32) -> DomainResult<Vec<Reservation>> {
        Ok(self
            .state
            .read()
            .reservations
            .values()
            .filter(|r| r.lot_id == lot_id)
            .cloned()
            .collect())
    }

    async fn find_active_by_user_email(&self, email: &str) -> DomainResult<Vec<Reservation>> {
        let mut found: Vec<Reservation> = self
            .state
            .read()
            .reservations
            .values()
            .filter(|r| r.user_email == email && r.is_active())
            .cloned()
            .collect();
        found.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(b.id.cmp(&a.id)));
        Ok(found)
    }

    async fn find_active_for_spot(&self, spot_id: i32) -> DomainResult<Option<Reservation>> {
        Ok(self
            .state
            .read()
            .reservations
            .values()
            .find(|r| r.spot_id == spot_id && r.is_active())
            .cloned())
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> DomainResult<Vec<Reservation>> {
        Ok(self
            .state
            .read()
            .reservations
            .values()
            .filter(|r| r.is_overdue(now))
            .cloned()
            .collect())
    }

    async fn total_revenue_by_lot(&self, lot_id: i32) -> DomainResult<Decimal> {
        Ok(self
            .state
            .read()
            .reservations
            .values()
            .filter(|r| r.lot_id == lot_id && r.status == ReservationStatus::Completed)
            .map(|r| r.total_amount)
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_lot(total: u32) -> (InMemoryParkingStore, ParkingLot, Vec<ParkingSpot>) {
        let store = InMemoryParkingStore::new();
        let (lot, spots) = store
            .create_lot(
                NewParkingLot::new("Agdal", total, Decimal::new(1000, 2)),
                NewParkingSpot::generate(total),
                Utc::now(),
            )
            .await
            .unwrap();
        (store, lot, spots)
    }

    #[tokio::test]
    async fn ids_are_sequential_across_lots() {
        let (store, first, spots) = store_with_lot(2).await;
        let (second, more) = store
            .create_lot(
                NewParkingLot::new("Hassan", 1, Decimal::ONE),
                NewParkingSpot::generate(1),
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!((first.id, second.id), (1, 2));
        assert_eq!(spots.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(more[0].id, 3);
        assert_eq!(more[0].spot_number, "A-1");
    }

    #[tokio::test]
    async fn spot_count_must_match_total() {
        let store = InMemoryParkingStore::new();
        let result = store
            .create_lot(
                NewParkingLot::new("Agdal", 3, Decimal::ONE),
                NewParkingSpot::generate(2),
                Utc::now(),
            )
            .await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(store.lots().find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_guard_writes_nothing() {
        let (store, lot, spots) = store_with_lot(1).await;
        let change = ChangeSet::transition(&spots[0], SpotStatus::Occupied, Utc::now()).unwrap();
        store.apply(change.clone()).await.unwrap();

        // Same change again: the spot is no longer AVAILABLE.
        assert!(matches!(
            store.apply(change).await,
            Err(DomainError::StateConflict(_))
        ));
        let occupancy = store.lots().occupancy(lot.id).await.unwrap().unwrap();
        assert_eq!(occupancy.occupied, 1);
        assert_eq!(occupancy.lot.available_spots, 0);
        assert!(occupancy.is_consistent());
    }

    #[tokio::test]
    async fn recount_uses_literal_statuses() {
        let (store, lot, spots) = store_with_lot(3).await;
        let change = ChangeSet::transition(&spots[1], SpotStatus::Maintenance, Utc::now())
            .unwrap()
            .recount();
        let applied = store.apply(change).await.unwrap();
        assert_eq!(applied.lot.available_spots, 2);
        assert_eq!(
            store.spots().count_by_lot_and_status(lot.id, SpotStatus::Maintenance).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn manual_override_is_stored() {
        let (store, lot, _) = store_with_lot(1).await;
        let closed = store.set_lot_status(lot.id, LotStatus::Closed, Utc::now()).await.unwrap();
        assert_eq!(closed.status, LotStatus::Closed);
        assert_eq!(store.lots().find_by_status(LotStatus::Closed).await.unwrap().len(), 1);
        assert!(matches!(
            store.set_lot_status(99, LotStatus::Closed, Utc::now()).await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
