//! Parking lot repository interface

use async_trait::async_trait;

use super::model::{LotOccupancy, LotStatus, ParkingLot};
use crate::domain::DomainResult;

#[async_trait]
pub trait ParkingLotRepository: Send + Sync {
    /// Find lot by ID
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<ParkingLot>>;

    /// All lots, ordered by id
    async fn find_all(&self) -> DomainResult<Vec<ParkingLot>>;

    /// Lots in the given status
    async fn find_by_status(&self, status: LotStatus) -> DomainResult<Vec<ParkingLot>>;

    /// Sum of `available_spots` over ACTIVE lots
    async fn total_available_spots(&self) -> DomainResult<u64>;

    /// Lot and its per-status spot counts from one consistent read
    async fn occupancy(&self, lot_id: i32) -> DomainResult<Option<LotOccupancy>>;
}
