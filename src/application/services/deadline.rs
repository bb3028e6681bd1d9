//! Call deadline at the service boundary
//!
//! Each call runs on its own task and is never cancelled. When the deadline
//! passes the caller gets `TransportFailure` while the call may still
//! complete in the background, so its effect is unknown.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::warn;

use crate::domain::{
    DomainError, DomainResult, LotStatus, NewParkingLot, ParkingLot, ParkingService, ParkingSpot,
    Reservation, ReservationRequest, SpotStatus,
};

#[derive(Clone)]
pub struct DeadlineParkingService {
    inner: Arc<dyn ParkingService>,
    deadline: Duration,
}

impl DeadlineParkingService {
    pub fn new(inner: Arc<dyn ParkingService>, deadline: Duration) -> Self {
        Self { inner, deadline }
    }

    async fn call<T, F, Fut>(&self, operation: &'static str, f: F) -> DomainResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<dyn ParkingService>) -> Fut,
        Fut: Future<Output = DomainResult<T>> + Send + 'static,
    {
        let task = tokio::spawn(f(self.inner.clone()));
        match tokio::time::timeout(self.deadline, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(DomainError::TransportFailure(format!(
                "{} aborted: {}",
                operation, join_error
            ))),
            Err(_) => {
                let deadline_ms = u64::try_from(self.deadline.as_millis()).unwrap_or(u64::MAX);
                warn!(operation, deadline_ms, "Call deadline elapsed");
                Err(DomainError::TransportFailure(format!(
                    "{} did not answer within {} ms",
                    operation, deadline_ms
                )))
            }
        }
    }
}

#[async_trait]
impl ParkingService for DeadlineParkingService {
    async fn create_parking_lot(&self, lot: NewParkingLot) -> DomainResult<ParkingLot> {
        self.call("create_parking_lot", |s| async move { s.create_parking_lot(lot).await })
            .await
    }

    async fn get_all_parking_lots(&self) -> DomainResult<Vec<ParkingLot>> {
        self.call("get_all_parking_lots", |s| async move { s.get_all_parking_lots().await })
            .await
    }

    async fn get_parking_lot_by_id(&self, id: i32) -> DomainResult<ParkingLot> {
        self.call("get_parking_lot_by_id", move |s| async move { s.get_parking_lot_by_id(id).await })
            .await
    }

    async fn get_active_parking_lots(&self) -> DomainResult<Vec<ParkingLot>> {
        self.call("get_active_parking_lots", |s| async move { s.get_active_parking_lots().await })
            .await
    }

    async fn get_total_available_spots(&self) -> DomainResult<u64> {
        self.call("get_total_available_spots", |s| async move {
            s.get_total_available_spots().await
        })
        .await
    }

    async fn get_occupancy_rate(&self, lot_id: i32) -> DomainResult<f64> {
        self.call("get_occupancy_rate", move |s| async move { s.get_occupancy_rate(lot_id).await })
            .await
    }

    async fn set_parking_lot_status(&self, lot_id: i32, status: LotStatus) -> DomainResult<ParkingLot> {
        self.call("set_parking_lot_status", move |s| async move {
            s.set_parking_lot_status(lot_id, status).await
        })
        .await
    }

    async fn get_all_spots_by_parking_lot(&self, lot_id: i32) -> DomainResult<Vec<ParkingSpot>> {
        self.call("get_all_spots_by_parking_lot", move |s| async move {
            s.get_all_spots_by_parking_lot(lot_id).await
        })
        .await
    }

    async fn get_available_spots(&self, lot_id: i32) -> DomainResult<Vec<ParkingSpot>> {
        self.call("get_available_spots", move |s| async move { s.get_available_spots(lot_id).await })
            .await
    }

    async fn get_available_spots_count(&self, lot_id: i32) -> DomainResult<u64> {
        self.call("get_available_spots_count", move |s| async move {
            s.get_available_spots_count(lot_id).await
        })
        .await
    }

    async fn get_spot_by_id(&self, id: i32) -> DomainResult<ParkingSpot> {
        self.call("get_spot_by_id", move |s| async move { s.get_spot_by_id(id).await })
            .await
    }

    async fn update_spot_status(&self, id: i32, status: SpotStatus) -> DomainResult<ParkingSpot> {
        self.call("update_spot_status", move |s| async move {
            s.update_spot_status(id, status).await
        })
        .await
    }

    async fn find_by_status(&self, status: SpotStatus) -> DomainResult<Vec<ParkingSpot>> {
        self.call("find_by_status", move |s| async move { s.find_by_status(status).await })
            .await
    }

    async fn find_by_parking_lot_id_and_status(
        &self,
        lot_id: i32,
        status: SpotStatus,
    ) -> DomainResult<Vec<ParkingSpot>> {
        self.call("find_by_parking_lot_id_and_status", move |s| async move {
            s.find_by_parking_lot_id_and_status(lot_id, status).await
        })
        .await
    }

    async fn count_available_spots(&self, lot_id: i32) -> DomainResult<u64> {
        self.call("count_available_spots", move |s| async move {
            s.count_available_spots(lot_id).await
        })
        .await
    }

    async fn count_occupied_spots(&self, lot_id: i32) -> DomainResult<u64> {
        self.call("count_occupied_spots", move |s| async move {
            s.count_occupied_spots(lot_id).await
        })
        .await
    }

    async fn create_reservation(&self, request: ReservationRequest) -> DomainResult<Reservation> {
        self.call("create_reservation", |s| async move { s.create_reservation(request).await })
            .await
    }

    async fn cancel_reservation(&self, id: i32) -> DomainResult<bool> {
        self.call("cancel_reservation", move |s| async move { s.cancel_reservation(id).await })
            .await
    }

    async fn confirm_reservation(&self, id: i32) -> DomainResult<Reservation> {
        self.call("confirm_reservation", move |s| async move { s.confirm_reservation(id).await })
            .await
    }

    async fn check_in(&self, id: i32) -> DomainResult<Reservation> {
        self.call("check_in", move |s| async move { s.check_in(id).await })
            .await
    }

    async fn check_out(&self, id: i32) -> DomainResult<Reservation> {
        self.call("check_out", move |s| async move { s.check_out(id).await })
            .await
    }

    async fn get_reservation_by_id(&self, id: i32) -> DomainResult<Reservation> {
        self.call("get_reservation_by_id", move |s| async move { s.get_reservation_by_id(id).await })
            .await
    }

    async fn get_reservations_by_user_email(&self, email: &str) -> DomainResult<Vec<Reservation>> {
        let email = email.to_string();
        self.call("get_reservations_by_user_email", |s| async move {
            s.get_reservations_by_user_email(&email).await
        })
        .await
    }

    async fn get_reservations_by_parking_lot(&self, lot_id: i32) -> DomainResult<Vec<Reservation>> {
        self.call("get_reservations_by_parking_lot", move |s| async move {
            s.get_reservations_by_parking_lot(lot_id).await
        })
        .await
    }

    async fn get_total_revenue_by_parking_lot_id(&self, lot_id: i32) -> DomainResult<Decimal> {
        self.call("get_total_revenue_by_parking_lot_id", move |s| async move {
            s.get_total_revenue_by_parking_lot_id(lot_id).await
        })
        .await
    }

    async fn expire_reservations(&self, now: DateTime<Utc>) -> DomainResult<Vec<Reservation>> {
        self.call("expire_reservations", move |s| async move { s.expire_reservations(now).await })
            .await
    }

    async fn simulate_car_entry(&self, spot_id: i32) -> DomainResult<bool> {
        self.call("simulate_car_entry", move |s| async move { s.simulate_car_entry(spot_id).await })
            .await
    }

    async fn simulate_car_exit(&self, spot_id: i32) -> DomainResult<bool> {
        self.call("simulate_car_exit", move |s| async move { s.simulate_car_exit(spot_id).await })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::create_event_bus;
    use crate::application::parking::AllocationCoordinator;
    use crate::application::services::ParkingServiceImpl;
    use crate::config::AllocationConfig;
    use crate::domain::{Applied, ChangeSet, NewParkingSpot, ParkingStore};
    use crate::domain::lot::ParkingLotRepository;
    use crate::domain::reservation::ReservationRepository;
    use crate::domain::spot::ParkingSpotRepository;
    use crate::infrastructure::storage::InMemoryParkingStore;

    /// Store whose commits take longer than the call deadline.
    struct SlowStore {
        inner: InMemoryParkingStore,
        delay: Duration,
    }

    #[async_trait]
    impl ParkingStore for SlowStore {
        fn lots(&self) -> &dyn ParkingLotRepository {
            self.inner.lots()
        }

        fn spots(&self) -> &dyn ParkingSpotRepository {
            self.inner.spots()
        }

        fn reservations(&self) -> &dyn ReservationRepository {
            self.inner.reservations()
        }

        async fn create_lot(
            &self,
            lot: NewParkingLot,
            spots: Vec<NewParkingSpot>,
            at: DateTime<Utc>,
        ) -> DomainResult<(ParkingLot, Vec<ParkingSpot>)> {
            self.inner.create_lot(lot, spots, at).await
        }

        async fn apply(&self, change: ChangeSet) -> DomainResult<Applied> {
            tokio::time::sleep(self.delay).await;
            self.inner.apply(change).await
        }

        async fn set_lot_status(
            &self,
            lot_id: i32,
            status: LotStatus,
            at: DateTime<Utc>,
        ) -> DomainResult<ParkingLot> {
            self.inner.set_lot_status(lot_id, status, at).await
        }
    }

    fn slow_service(delay_ms: u64, deadline_ms: u64) -> DeadlineParkingService {
        let store = Arc::new(SlowStore {
            inner: InMemoryParkingStore::new(),
            delay: Duration::from_millis(delay_ms),
        });
        let coordinator = AllocationCoordinator::new(store, &AllocationConfig::default(), create_event_bus());
        DeadlineParkingService::new(
            Arc::new(ParkingServiceImpl::new(Arc::new(coordinator))),
            Duration::from_millis(deadline_ms),
        )
    }

    #[tokio::test]
    async fn fast_calls_pass_through() {
        let svc = slow_service(0, 1_000);
        let lot = svc
            .create_parking_lot(NewParkingLot::new("Agdal", 2, Decimal::ONE))
            .await
            .unwrap();
        assert_eq!(svc.count_available_spots(lot.id).await.unwrap(), 2);
        assert!(matches!(
            svc.get_spot_by_id(999).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn elapsed_deadline_means_effect_unknown() {
        let svc = slow_service(150, 20);
        let lot = svc
            .create_parking_lot(NewParkingLot::new("Agdal", 2, Decimal::ONE))
            .await
            .unwrap();
        let spot = svc.get_available_spots(lot.id).await.unwrap().remove(0);

        let err = svc.simulate_car_entry(spot.id).await.unwrap_err();
        assert!(err.is_effect_unknown());

        // The call was not cancelled; re-query shows it landed.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(
            svc.get_spot_by_id(spot.id).await.unwrap().status,
            SpotStatus::Occupied
        );
        assert_eq!(svc.count_available_spots(lot.id).await.unwrap(), 1);
    }
}
