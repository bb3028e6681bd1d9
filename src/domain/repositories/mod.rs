//! Store traits for the domain layer
//!
//! Contains:
//! - `ParkingStore`: read access to every repository plus the atomic writers
//! - `DomainResult`: standard result type for domain operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::lot::{LotStatus, NewParkingLot, ParkingLot, ParkingLotRepository};
use super::reservation::ReservationRepository;
use super::spot::{NewParkingSpot, ParkingSpot, ParkingSpotRepository};
use super::transition::{Applied, ChangeSet};
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Provides access to all domain repositories and the only write paths.
///
/// Readers request only the repository they need:
///
/// ```ignore
/// async fn handle(store: &dyn ParkingStore) {
///     let spot = store.spots().find_by_id(7).await?;
///     let held = store.reservations().find_active_for_spot(7).await?;
/// }
/// ```
///
/// Every write is one atomic unit. A spot status and its lot's counter are
/// never visible half-updated.
#[async_trait]
pub trait ParkingStore: Send + Sync {
    fn lots(&self) -> &dyn ParkingLotRepository;
    fn spots(&self) -> &dyn ParkingSpotRepository;
    fn reservations(&self) -> &dyn ReservationRepository;

    /// Persist a lot together with its spots.
    async fn create_lot(
        &self,
        lot: NewParkingLot,
        spots: Vec<NewParkingSpot>,
        at: DateTime<Utc>,
    ) -> DomainResult<(ParkingLot, Vec<ParkingSpot>)>;

    /// Commit a change set, or nothing if any guard fails.
    async fn apply(&self, change: ChangeSet) -> DomainResult<Applied>;

    /// Manual lot status override.
    async fn set_lot_status(
        &self,
        lot_id: i32,
        status: LotStatus,
        at: DateTime<Utc>,
    ) -> DomainResult<ParkingLot>;
}
