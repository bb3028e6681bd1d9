//! In-process `ParkingService`

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::application::parking::AllocationCoordinator;
use crate::domain::{
    DomainResult, LotStatus, NewParkingLot, ParkingLot, ParkingService, ParkingSpot, Reservation,
    ReservationRequest, SpotStatus,
};

/// Writes go through the coordinator; reads go straight to the components.
#[derive(Clone)]
pub struct ParkingServiceImpl {
    coordinator: Arc<AllocationCoordinator>,
}

impl ParkingServiceImpl {
    pub fn new(coordinator: Arc<AllocationCoordinator>) -> Self {
        Self { coordinator }
    }

    pub fn coordinator(&self) -> &Arc<AllocationCoordinator> {
        &self.coordinator
    }
}

#[async_trait]
impl ParkingService for ParkingServiceImpl {
    async fn create_parking_lot(&self, lot: NewParkingLot) -> DomainResult<ParkingLot> {
        self.coordinator.create_lot(lot).await
    }

    async fn get_all_parking_lots(&self) -> DomainResult<Vec<ParkingLot>> {
        self.coordinator.lots().all_lots().await
    }

    async fn get_parking_lot_by_id(&self, id: i32) -> DomainResult<ParkingLot> {
        self.coordinator.lots().get_lot(id).await
    }

    async fn get_active_parking_lots(&self) -> DomainResult<Vec<ParkingLot>> {
        self.coordinator.lots().active_lots().await
    }

    async fn get_total_available_spots(&self) -> DomainResult<u64> {
        self.coordinator.lots().total_available_spots().await
    }

    async fn get_occupancy_rate(&self, lot_id: i32) -> DomainResult<f64> {
        self.coordinator.lots().occupancy_rate(lot_id).await
    }

    async fn set_parking_lot_status(&self, lot_id: i32, status: LotStatus) -> DomainResult<ParkingLot> {
        self.coordinator.set_lot_status(lot_id, status).await
    }

    async fn get_all_spots_by_parking_lot(&self, lot_id: i32) -> DomainResult<Vec<ParkingSpot>> {
        self.coordinator.spots().find_by_lot(lot_id).await
    }

    async fn get_available_spots(&self, lot_id: i32) -> DomainResult<Vec<ParkingSpot>> {
        self.coordinator
            .spots()
            .find_by_lot_and_status(lot_id, SpotStatus::Available)
            .await
    }

    async fn get_available_spots_count(&self, lot_id: i32) -> DomainResult<u64> {
        self.coordinator.lots().count_available(lot_id).await
    }

    async fn get_spot_by_id(&self, id: i32) -> DomainResult<ParkingSpot> {
        self.coordinator.spots().get_spot(id).await
    }

    async fn update_spot_status(&self, id: i32, status: SpotStatus) -> DomainResult<ParkingSpot> {
        self.coordinator.update_spot_status(id, status).await
    }

    async fn find_by_status(&self, status: SpotStatus) -> DomainResult<Vec<ParkingSpot>> {
        self.coordinator.spots().find_by_status(status).await
    }

    async fn find_by_parking_lot_id_and_status(
        &self,
        lot_id: i32,
        status: SpotStatus,
    ) -> DomainResult<Vec<ParkingSpot>> {
        self.coordinator.spots().find_by_lot_and_status(lot_id, status).await
    }

    async fn count_available_spots(&self, lot_id: i32) -> DomainResult<u64> {
        self.coordinator.lots().count_available(lot_id).await
    }

    async fn count_occupied_spots(&self, lot_id: i32) -> DomainResult<u64> {
        self.coordinator.lots().count_occupied(lot_id).await
    }

    async fn create_reservation(&self, request: ReservationRequest) -> DomainResult<Reservation> {
        self.coordinator.create_reservation(request).await
    }

    async fn cancel_reservation(&self, id: i32) -> DomainResult<bool> {
        self.coordinator.cancel_reservation(id).await
    }

    async fn confirm_reservation(&self, id: i32) -> DomainResult<Reservation> {
        self.coordinator.confirm_reservation(id).await
    }

    async fn check_in(&self, id: i32) -> DomainResult<Reservation> {
        self.coordinator.check_in(id).await
    }

    async fn check_out(&self, id: i32) -> DomainResult<Reservation> {
        self.coordinator.check_out(id).await
    }

    async fn get_reservation_by_id(&self, id: i32) -> DomainResult<Reservation> {
        self.coordinator.ledger().get(id).await
    }

    async fn get_reservations_by_user_email(&self, email: &str) -> DomainResult<Vec<Reservation>> {
        self.coordinator.ledger().by_user_email(email).await
    }

    async fn get_reservations_by_parking_lot(&self, lot_id: i32) -> DomainResult<Vec<Reservation>> {
        self.coordinator.ledger().by_lot(lot_id).await
    }

    async fn get_total_revenue_by_parking_lot_id(&self, lot_id: i32) -> DomainResult<Decimal> {
        self.coordinator.ledger().total_revenue(lot_id).await
    }

    async fn expire_reservations(&self, now: DateTime<Utc>) -> DomainResult<Vec<Reservation>> {
        self.coordinator.expire_reservations(now).await
    }

    async fn simulate_car_entry(&self, spot_id: i32) -> DomainResult<bool> {
        self.coordinator.simulate_car_entry(spot_id).await
    }

    async fn simulate_car_exit(&self, spot_id: i32) -> DomainResult<bool> {
        self.coordinator.simulate_car_exit(spot_id).await
    }
}
