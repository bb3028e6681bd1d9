#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm_migration::MigratorTrait;

use parking_core::application::services::ParkingServiceImpl;
use parking_core::config::AllocationConfig;
use parking_core::domain::{NewParkingLot, ParkingLot, ReservationRequest};
use parking_core::infrastructure::database::migrator::Migrator;
use parking_core::{
    create_event_bus, init_database, AllocationCoordinator, DatabaseConfig, InMemoryParkingStore,
    ParkingService, ParkingStore, SeaOrmParkingStore,
};

pub fn service_over(store: Arc<dyn ParkingStore>) -> Arc<dyn ParkingService> {
    let coordinator = AllocationCoordinator::new(store, &AllocationConfig::default(), create_event_bus());
    Arc::new(ParkingServiceImpl::new(Arc::new(coordinator)))
}

pub fn memory_service() -> Arc<dyn ParkingService> {
    service_over(Arc::new(InMemoryParkingStore::new()))
}

pub async fn sqlite_service() -> Arc<dyn ParkingService> {
    let db = init_database(&DatabaseConfig::in_memory()).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    service_over(Arc::new(SeaOrmParkingStore::new(db)))
}

/// Lot with `spots` spots at 10.00 per hour
pub async fn lot(service: &Arc<dyn ParkingService>, spots: u32) -> ParkingLot {
    service
        .create_parking_lot(NewParkingLot::new("Maarif", spots, Decimal::new(1000, 2)))
        .await
        .unwrap()
}

pub fn request(spot_id: i32, hours: u32) -> ReservationRequest {
    ReservationRequest {
        spot_id,
        user_name: "Yasmine Alaoui".into(),
        user_email: "yasmine@example.com".into(),
        user_phone: "+212600000000".into(),
        license_plate: "12345-a-6".into(),
        start_time: Utc::now() + Duration::minutes(5),
        end_time: None,
        duration_hours: Some(hours),
    }
}

/// Spot counter matches the literal AVAILABLE count
pub async fn assert_counter_consistent(service: &Arc<dyn ParkingService>, lot_id: i32) {
    let lot = service.get_parking_lot_by_id(lot_id).await.unwrap();
    let literal = service.count_available_spots(lot_id).await.unwrap();
    assert_eq!(u64::from(lot.available_spots), literal, "lot {} counter drifted", lot_id);
}
