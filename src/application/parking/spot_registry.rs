//! Spot lookups and the spot transition gate

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{ChangeSet, DomainError, DomainResult, ParkingSpot, ParkingStore, SpotStatus};

/// Owns spot reads and turns a requested status into a change set.
///
/// Nothing here writes; the coordinator commits what `set_status` returns.
#[derive(Clone)]
pub struct SpotRegistry {
    store: Arc<dyn ParkingStore>,
}

impl SpotRegistry {
    pub fn new(store: Arc<dyn ParkingStore>) -> Self {
        Self { store }
    }

    pub async fn get_spot(&self, id: i32) -> DomainResult<ParkingSpot> {
        self.store
            .spots()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("ParkingSpot", id))
    }

    /// Validate `spot → next` against the transition table.
    pub fn set_status(
        &self,
        spot: &ParkingSpot,
        next: SpotStatus,
        at: DateTime<Utc>,
    ) -> DomainResult<ChangeSet> {
        ChangeSet::transition(spot, next, at)
    }

    pub async fn find_by_lot(&self, lot_id: i32) -> DomainResult<Vec<ParkingSpot>> {
        self.store.spots().find_by_lot(lot_id).await
    }

    pub async fn find_by_status(&self, status: SpotStatus) -> DomainResult<Vec<ParkingSpot>> {
        self.store.spots().find_by_status(status).await
    }

    pub async fn find_by_lot_and_status(
        &self,
        lot_id: i32,
        status: SpotStatus,
    ) -> DomainResult<Vec<ParkingSpot>> {
        self.store.spots().find_by_lot_and_status(lot_id, status).await
    }

    pub async fn count_by_lot_and_status(&self, lot_id: i32, status: SpotStatus) -> DomainResult<u64> {
        self.store.spots().count_by_lot_and_status(lot_id, status).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CounterAdjustment, NewParkingLot};
    use crate::infrastructure::storage::InMemoryParkingStore;
    use rust_decimal::Decimal;

    async fn registry_with_lot(spots: u32) -> (SpotRegistry, i32) {
        let store = Arc::new(InMemoryParkingStore::new());
        let lot = NewParkingLot::new("Agdal", spots, Decimal::new(1000, 2));
        let (lot, _) = store
            .create_lot(lot, crate::domain::NewParkingSpot::generate(spots), Utc::now())
            .await
            .unwrap();
        (SpotRegistry::new(store), lot.id)
    }

    #[tokio::test]
    async fn unknown_spot_is_not_found() {
        let (registry, _) = registry_with_lot(1).await;
        assert!(matches!(
            registry.get_spot(999).await,
            Err(DomainError::NotFound { entity: "ParkingSpot", .. })
        ));
    }

    #[tokio::test]
    async fn set_status_does_not_write() {
        let (registry, lot_id) = registry_with_lot(2).await;
        let spot = registry.find_by_lot(lot_id).await.unwrap().remove(0);

        let change = registry.set_status(&spot, SpotStatus::Reserved, Utc::now()).unwrap();
        assert_eq!(change.counter, CounterAdjustment::Decrement);
        assert_eq!(registry.get_spot(spot.id).await.unwrap().status, SpotStatus::Available);
        assert_eq!(
            registry.count_by_lot_and_status(lot_id, SpotStatus::Available).await.unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn illegal_transition_is_rejected() {
        let (registry, lot_id) = registry_with_lot(1).await;
        let spot = registry.find_by_lot(lot_id).await.unwrap().remove(0);
        assert!(matches!(
            registry.set_status(&spot, SpotStatus::Available, Utc::now()),
            Err(DomainError::StateConflict(_))
        ));
    }
}
