//! Lot lifecycle and occupancy projections

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::domain::{
    DomainError, DomainResult, LotOccupancy, LotStatus, NewParkingLot, NewParkingSpot, ParkingLot,
    ParkingSpot, ParkingStore, SpotStatus,
};

/// Reads and writes of lot-level state.
///
/// The counter itself is only ever moved by a committed change set; this
/// type owns lot creation, the manual status override and the projections.
#[derive(Clone)]
pub struct LotAggregate {
    store: Arc<dyn ParkingStore>,
}

impl LotAggregate {
    pub fn new(store: Arc<dyn ParkingStore>) -> Self {
        Self { store }
    }

    /// Validate and persist a lot with its generated spots.
    pub async fn create_lot(
        &self,
        lot: NewParkingLot,
        at: DateTime<Utc>,
    ) -> DomainResult<(ParkingLot, Vec<ParkingSpot>)> {
        lot.check()?;
        let spots = NewParkingSpot::generate(lot.total_spots);
        let (lot, spots) = self.store.create_lot(lot, spots, at).await?;
        info!(lot_id = lot.id, name = %lot.name, total_spots = lot.total_spots, "Parking lot created");
        Ok((lot, spots))
    }

    pub async fn set_status(
        &self,
        lot_id: i32,
        status: LotStatus,
        at: DateTime<Utc>,
    ) -> DomainResult<ParkingLot> {
        if status == LotStatus::Full {
            return Err(DomainError::Validation(
                "FULL is derived from occupancy and cannot be set manually".into(),
            ));
        }
        self.store.set_lot_status(lot_id, status, at).await
    }

    pub async fn get_lot(&self, id: i32) -> DomainResult<ParkingLot> {
        self.store
            .lots()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("ParkingLot", id))
    }

    pub async fn all_lots(&self) -> DomainResult<Vec<ParkingLot>> {
        self.store.lots().find_all().await
    }

    pub async fn active_lots(&self) -> DomainResult<Vec<ParkingLot>> {
        self.store.lots().find_by_status(LotStatus::Active).await
    }

    pub async fn total_available_spots(&self) -> DomainResult<u64> {
        self.store.lots().total_available_spots().await
    }

    pub async fn occupancy(&self, lot_id: i32) -> DomainResult<LotOccupancy> {
        self.store
            .lots()
            .occupancy(lot_id)
            .await?
            .ok_or_else(|| DomainError::not_found("ParkingLot", lot_id))
    }

    /// Percentage of the lot's spots not AVAILABLE, from literal spot statuses.
    pub async fn occupancy_rate(&self, lot_id: i32) -> DomainResult<f64> {
        Ok(self.occupancy(lot_id).await?.occupancy_rate())
    }

    pub async fn count_available(&self, lot_id: i32) -> DomainResult<u64> {
        self.store
            .spots()
            .count_by_lot_and_status(lot_id, SpotStatus::Available)
            .await
    }

    pub async fn count_occupied(&self, lot_id: i32) -> DomainResult<u64> {
        self.store
            .spots()
            .count_by_lot_and_status(lot_id, SpotStatus::Occupied)
            .await
    }
}
