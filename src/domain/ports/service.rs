//! Parking service contract

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::lot::{LotStatus, NewParkingLot, ParkingLot};
use crate::domain::reservation::{Reservation, ReservationRequest};
use crate::domain::spot::{ParkingSpot, SpotStatus};
use crate::domain::DomainResult;

/// Request/response surface grouped by entity.
///
/// A `TransportFailure` from a mutating call means the effect is unknown:
/// re-query state before issuing it again.
#[async_trait]
pub trait ParkingService: Send + Sync {
    // ── Lots ───────────────────────────────────────────────────

    /// Creates the lot and its `total_spots` AVAILABLE spots.
    async fn create_parking_lot(&self, lot: NewParkingLot) -> DomainResult<ParkingLot>;
    async fn get_all_parking_lots(&self) -> DomainResult<Vec<ParkingLot>>;
    async fn get_parking_lot_by_id(&self, id: i32) -> DomainResult<ParkingLot>;
    async fn get_active_parking_lots(&self) -> DomainResult<Vec<ParkingLot>>;
    async fn get_total_available_spots(&self) -> DomainResult<u64>;
    async fn get_occupancy_rate(&self, lot_id: i32) -> DomainResult<f64>;
    async fn set_parking_lot_status(&self, lot_id: i32, status: LotStatus) -> DomainResult<ParkingLot>;

    // ── Spots ──────────────────────────────────────────────────

    async fn get_all_spots_by_parking_lot(&self, lot_id: i32) -> DomainResult<Vec<ParkingSpot>>;
    async fn get_available_spots(&self, lot_id: i32) -> DomainResult<Vec<ParkingSpot>>;
    async fn get_available_spots_count(&self, lot_id: i32) -> DomainResult<u64>;
    async fn get_spot_by_id(&self, id: i32) -> DomainResult<ParkingSpot>;
    /// Manual override; the lot counter is recounted from spot statuses.
    async fn update_spot_status(&self, id: i32, status: SpotStatus) -> DomainResult<ParkingSpot>;
    async fn find_by_status(&self, status: SpotStatus) -> DomainResult<Vec<ParkingSpot>>;
    async fn find_by_parking_lot_id_and_status(
        &self,
        lot_id: i32,
        status: SpotStatus,
    ) -> DomainResult<Vec<ParkingSpot>>;
    async fn count_available_spots(&self, lot_id: i32) -> DomainResult<u64>;
    async fn count_occupied_spots(&self, lot_id: i32) -> DomainResult<u64>;

    // ── Reservations ───────────────────────────────────────────

    async fn create_reservation(&self, request: ReservationRequest) -> DomainResult<Reservation>;
    async fn cancel_reservation(&self, id: i32) -> DomainResult<bool>;
    async fn confirm_reservation(&self, id: i32) -> DomainResult<Reservation>;
    async fn check_in(&self, id: i32) -> DomainResult<Reservation>;
    async fn check_out(&self, id: i32) -> DomainResult<Reservation>;
    async fn get_reservation_by_id(&self, id: i32) -> DomainResult<Reservation>;
    async fn get_reservations_by_user_email(&self, email: &str) -> DomainResult<Vec<Reservation>>;
    async fn get_reservations_by_parking_lot(&self, lot_id: i32) -> DomainResult<Vec<Reservation>>;
    async fn get_total_revenue_by_parking_lot_id(&self, lot_id: i32) -> DomainResult<Decimal>;
    /// Housekeeping: expire overdue reservations, returning the expired ones.
    async fn expire_reservations(&self, now: DateTime<Utc>) -> DomainResult<Vec<Reservation>>;

    // ── Simulation ─────────────────────────────────────────────

    async fn simulate_car_entry(&self, spot_id: i32) -> DomainResult<bool>;
    async fn simulate_car_exit(&self, spot_id: i32) -> DomainResult<bool>;
}
