//! The relational store on an in-memory SQLite database.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm_migration::MigratorTrait;

use parking_core::domain::{
    ChangeSet, DomainError, LotStatus, NewParkingLot, NewParkingSpot, NewReservation,
    ReservationStatus, ReservationWindow, ReservationWrite, SpotStatus,
};
use parking_core::infrastructure::database::migrator::Migrator;
use parking_core::{init_database, DatabaseConfig, ParkingStore, SeaOrmParkingStore};

async fn store() -> SeaOrmParkingStore {
    let db = init_database(&DatabaseConfig::in_memory()).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    SeaOrmParkingStore::new(db)
}

fn new_lot(spots: u32) -> (NewParkingLot, Vec<NewParkingSpot>) {
    (
        NewParkingLot::new("Ain Diab", spots, Decimal::new(750, 2)),
        NewParkingSpot::generate(spots),
    )
}

fn new_reservation(spot_id: i32, lot_id: i32) -> NewReservation {
    let start = Utc::now() + Duration::hours(1);
    NewReservation {
        spot_id,
        lot_id,
        user_name: "Omar Bennani".into(),
        user_email: "omar@example.com".into(),
        user_phone: "0611223344".into(),
        license_plate: "A-77".into(),
        window: ReservationWindow::resolve(start, None, Some(2)).unwrap(),
        status: ReservationStatus::Confirmed,
        total_amount: Decimal::new(1500, 2),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn migrations_roll_back_and_forward() {
    let db = init_database(&DatabaseConfig::in_memory()).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    Migrator::down(&db, None).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    assert!(Migrator::get_pending_migrations(&db).await.unwrap().is_empty());
}

#[tokio::test]
async fn create_lot_persists_lot_and_spots() {
    let store = store().await;
    let (lot, spots) = new_lot(3);
    let (lot, spots) = store.create_lot(lot, spots, Utc::now()).await.unwrap();

    assert!(lot.id > 0);
    assert_eq!(lot.hourly_rate, Decimal::new(750, 2));
    assert_eq!(spots.len(), 3);
    assert!(spots.iter().all(|s| s.lot_id == lot.id));

    let occupancy = store.lots().occupancy(lot.id).await.unwrap().unwrap();
    assert_eq!(occupancy.available, 3);
    assert!(occupancy.is_consistent());
}

#[tokio::test]
async fn create_lot_rejects_mismatched_spot_count() {
    let store = store().await;
    let (lot, _) = new_lot(3);
    let result = store
        .create_lot(lot, NewParkingSpot::generate(2), Utc::now())
        .await;
    assert!(matches!(result, Err(DomainError::Validation(_))));
    assert!(store.lots().find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn stale_change_set_is_rejected_whole() {
    let store = store().await;
    let (lot, spots) = new_lot(2);
    let (lot, spots) = store.create_lot(lot, spots, Utc::now()).await.unwrap();
    let spot = spots[0].clone();

    let first = ChangeSet::transition(&spot, SpotStatus::Reserved, Utc::now())
        .unwrap()
        .with_reservation(ReservationWrite::Insert(new_reservation(spot.id, lot.id)));
    let second = first.clone();

    let applied = store.apply(first).await.unwrap();
    assert_eq!(applied.previous_spot_status, SpotStatus::Available);
    assert_eq!(applied.lot.available_spots, 1);
    let reservation = applied.reservation.unwrap();
    assert_eq!(reservation.total_amount, Decimal::new(1500, 2));

    // computed from the same stale read
    assert!(matches!(
        store.apply(second).await,
        Err(DomainError::StateConflict(_))
    ));

    let reservations = store.reservations().find_by_lot(lot.id).await.unwrap();
    assert_eq!(reservations.len(), 1);
    let lot = store.lots().find_by_id(lot.id).await.unwrap().unwrap();
    assert_eq!(lot.available_spots, 1);
}

#[tokio::test]
async fn insert_refuses_second_active_reservation() {
    let store = store().await;
    let (lot, spots) = new_lot(1);
    let (lot, spots) = store.create_lot(lot, spots, Utc::now()).await.unwrap();
    let spot = spots[0].clone();

    let reserve = ChangeSet::transition(&spot, SpotStatus::Reserved, Utc::now())
        .unwrap()
        .with_reservation(ReservationWrite::Insert(new_reservation(spot.id, lot.id)));
    let applied = store.apply(reserve).await.unwrap();

    // guard holds on the spot, but the spot already has an active reservation
    let sneaky = ChangeSet::hold(&applied.spot, Utc::now())
        .with_reservation(ReservationWrite::Insert(new_reservation(spot.id, lot.id)));
    assert!(matches!(
        store.apply(sneaky).await,
        Err(DomainError::SpotUnavailable(id)) if id == spot.id
    ));
}

#[tokio::test]
async fn reservation_update_checks_prior_status() {
    let store = store().await;
    let (lot, spots) = new_lot(1);
    let (lot, spots) = store.create_lot(lot, spots, Utc::now()).await.unwrap();
    let reserve = ChangeSet::transition(&spots[0], SpotStatus::Reserved, Utc::now())
        .unwrap()
        .with_reservation(ReservationWrite::Insert(new_reservation(spots[0].id, lot.id)));
    let applied = store.apply(reserve).await.unwrap();
    let reservation = applied.reservation.unwrap();

    let mut cancelled = reservation.clone();
    cancelled.cancel("changed plans", Utc::now()).unwrap();
    let release = ChangeSet::transition(&applied.spot, SpotStatus::Available, Utc::now())
        .unwrap()
        .with_reservation(ReservationWrite::Update {
            reservation: cancelled.clone(),
            expected: ReservationStatus::Pending,
        });
    assert!(matches!(
        store.apply(release).await,
        Err(DomainError::StateConflict(_))
    ));
    assert_eq!(
        store.spots().find_by_id(spots[0].id).await.unwrap().unwrap().status,
        SpotStatus::Reserved
    );

    let release = ChangeSet::transition(&applied.spot, SpotStatus::Available, Utc::now())
        .unwrap()
        .with_reservation(ReservationWrite::Update {
            reservation: cancelled,
            expected: ReservationStatus::Confirmed,
        });
    let applied = store.apply(release).await.unwrap();
    assert_eq!(applied.lot.available_spots, 1);

    let stored = store
        .reservations()
        .find_by_id(reservation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, ReservationStatus::Cancelled);
    assert_eq!(stored.cancellation_reason.as_deref(), Some("changed plans"));
    assert!(store
        .reservations()
        .find_active_for_spot(spots[0].id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn recount_and_lot_status_round_trip() {
    let store = store().await;
    let (lot, spots) = new_lot(1);
    let (lot, spots) = store.create_lot(lot, spots, Utc::now()).await.unwrap();

    let maintenance = ChangeSet::transition(&spots[0], SpotStatus::Maintenance, Utc::now())
        .unwrap()
        .recount();
    let applied = store.apply(maintenance).await.unwrap();
    assert_eq!(applied.lot.available_spots, 0);
    assert_eq!(applied.lot.status, LotStatus::Full);
    assert_eq!(applied.previous_lot_status, Some(LotStatus::Active));

    let closed = store
        .set_lot_status(lot.id, LotStatus::Closed, Utc::now())
        .await
        .unwrap();
    assert_eq!(closed.status, LotStatus::Closed);
    assert_eq!(
        store.lots().find_by_status(LotStatus::Closed).await.unwrap().len(),
        1
    );
    assert!(matches!(
        store.set_lot_status(999, LotStatus::Active, Utc::now()).await,
        Err(DomainError::NotFound { .. })
    ));
}
