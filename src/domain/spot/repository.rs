//! Parking spot repository interface

use async_trait::async_trait;

use super::model::{ParkingSpot, SpotStatus};
use crate::domain::DomainResult;

#[async_trait]
pub trait ParkingSpotRepository: Send + Sync {
    /// Find spot by ID
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<ParkingSpot>>;

    /// All spots of a lot, ordered by id
    async fn find_by_lot(&self, lot_id: i32) -> DomainResult<Vec<ParkingSpot>>;

    /// All spots in the given status, across lots
    async fn find_by_status(&self, status: SpotStatus) -> DomainResult<Vec<ParkingSpot>>;

    /// Spots of a lot in the given status
    async fn find_by_lot_and_status(
        &self,
        lot_id: i32,
        status: SpotStatus,
    ) -> DomainResult<Vec<ParkingSpot>>;

    /// Literal count of a lot's spots in the given status
    async fn count_by_lot_and_status(&self, lot_id: i32, status: SpotStatus) -> DomainResult<u64>;
}
