//! Allocation invariants, run against both storage backends.

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use common::{assert_counter_consistent, lot, request};
use parking_core::domain::{DomainError, LotStatus, NewParkingLot, ReservationStatus, SpotStatus};
use parking_core::ParkingService;

macro_rules! on_both_stores {
    ($($name:ident),* $(,)?) => {
        mod memory {
            $(
                #[tokio::test]
                async fn $name() {
                    super::$name(super::common::memory_service()).await;
                }
            )*
        }

        mod sqlite {
            $(
                #[tokio::test]
                async fn $name() {
                    super::$name(super::common::sqlite_service().await).await;
                }
            )*
        }
    };
}

on_both_stores!(
    new_lot_has_every_spot_available,
    reserving_twice_is_refused,
    cancelling_a_settled_reservation_changes_nothing,
    entry_then_exit_restores_counter,
    revenue_counts_completed_reservations_only,
    one_active_reservation_per_spot,
    manual_override_recounts_the_lot,
    overdue_reservations_expire,
    lot_fills_and_reopens,
    unknown_ids_are_not_found,
    exit_after_check_in_completes_the_reservation,
    exit_without_check_in_cancels_the_reservation,
    override_cancels_the_reservation,
    oversized_window_is_rejected,
    sub_cent_rates_are_rejected,
);

async fn new_lot_has_every_spot_available(service: Arc<dyn ParkingService>) {
    let lot = lot(&service, 5).await;
    assert_eq!(lot.available_spots, 5);
    assert_eq!(lot.status, LotStatus::Active);

    let spots = service.get_all_spots_by_parking_lot(lot.id).await.unwrap();
    assert_eq!(spots.len(), 5);
    assert!(spots.iter().all(|s| s.status == SpotStatus::Available));
    assert_eq!(spots[0].spot_number, "A-1");
    assert_eq!(service.get_total_available_spots().await.unwrap(), 5);
    assert_counter_consistent(&service, lot.id).await;
}

async fn reserving_twice_is_refused(service: Arc<dyn ParkingService>) {
    let lot = lot(&service, 2).await;
    let spot = service.get_available_spots(lot.id).await.unwrap()[0].clone();

    let reservation = service.create_reservation(request(spot.id, 2)).await.unwrap();
    assert_eq!(reservation.status, ReservationStatus::Confirmed);
    assert_eq!(reservation.total_amount, Decimal::new(2000, 2));
    assert_eq!(reservation.license_plate, "12345-A-6");
    assert_eq!(
        service.get_spot_by_id(spot.id).await.unwrap().status,
        SpotStatus::Reserved
    );

    let again = service.create_reservation(request(spot.id, 1)).await;
    assert!(matches!(again, Err(DomainError::SpotUnavailable(id)) if id == spot.id));

    let lot = service.get_parking_lot_by_id(lot.id).await.unwrap();
    assert_eq!(lot.available_spots, 1);
    assert_counter_consistent(&service, lot.id).await;
}

async fn cancelling_a_settled_reservation_changes_nothing(service: Arc<dyn ParkingService>) {
    let lot = lot(&service, 1).await;
    let spot_id = service.get_available_spots(lot.id).await.unwrap()[0].id;
    let reservation = service.create_reservation(request(spot_id, 1)).await.unwrap();

    assert!(service.cancel_reservation(reservation.id).await.unwrap());
    let cancelled = service.get_reservation_by_id(reservation.id).await.unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
    assert_eq!(cancelled.cancellation_reason.as_deref(), Some("Cancelled by user"));
    assert!(cancelled.cancelled_at.is_some());

    let lot_before = service.get_parking_lot_by_id(lot.id).await.unwrap();
    let again = service.cancel_reservation(reservation.id).await;
    assert!(matches!(again, Err(DomainError::StateConflict(_))));

    assert_eq!(service.get_reservation_by_id(reservation.id).await.unwrap(), cancelled);
    assert_eq!(service.get_parking_lot_by_id(lot.id).await.unwrap(), lot_before);
    assert_eq!(
        service.get_spot_by_id(spot_id).await.unwrap().status,
        SpotStatus::Available
    );

    // completed reservations are just as final
    let second = service.create_reservation(request(spot_id, 1)).await.unwrap();
    service.check_in(second.id).await.unwrap();
    service.check_out(second.id).await.unwrap();
    assert!(matches!(
        service.cancel_reservation(second.id).await,
        Err(DomainError::StateConflict(_))
    ));
    assert_counter_consistent(&service, lot.id).await;
}

async fn entry_then_exit_restores_counter(service: Arc<dyn ParkingService>) {
    let lot = lot(&service, 3).await;
    let spot_id = service.get_available_spots(lot.id).await.unwrap()[0].id;

    assert!(service.simulate_car_entry(spot_id).await.unwrap());
    let occupied = service.get_spot_by_id(spot_id).await.unwrap();
    assert_eq!(occupied.status, SpotStatus::Occupied);
    assert!(occupied.last_occupied_at.is_some());
    assert_eq!(service.get_parking_lot_by_id(lot.id).await.unwrap().available_spots, 2);
    assert_eq!(service.count_occupied_spots(lot.id).await.unwrap(), 1);

    assert!(matches!(
        service.simulate_car_entry(spot_id).await,
        Err(DomainError::StateConflict(_))
    ));

    assert!(service.simulate_car_exit(spot_id).await.unwrap());
    assert_eq!(service.get_parking_lot_by_id(lot.id).await.unwrap().available_spots, 3);
    assert!(matches!(
        service.simulate_car_exit(spot_id).await,
        Err(DomainError::StateConflict(_))
    ));
    assert_counter_consistent(&service, lot.id).await;
}

async fn revenue_counts_completed_reservations_only(service: Arc<dyn ParkingService>) {
    let lot = lot(&service, 2).await;
    assert_eq!(
        service.get_total_revenue_by_parking_lot_id(lot.id).await.unwrap(),
        Decimal::ZERO
    );

    let spots = service.get_available_spots(lot.id).await.unwrap();
    let finished = service.create_reservation(request(spots[0].id, 3)).await.unwrap();
    let open = service.create_reservation(request(spots[1].id, 2)).await.unwrap();

    let checked_in = service.check_in(finished.id).await.unwrap();
    assert!(checked_in.check_in_time.is_some());
    assert_eq!(
        service.get_spot_by_id(spots[0].id).await.unwrap().status,
        SpotStatus::Occupied
    );

    let completed = service.check_out(finished.id).await.unwrap();
    assert_eq!(completed.status, ReservationStatus::Completed);
    assert!(completed.check_out_time.is_some());
    assert_eq!(
        service.get_spot_by_id(spots[0].id).await.unwrap().status,
        SpotStatus::Available
    );

    assert_eq!(
        service.get_total_revenue_by_parking_lot_id(lot.id).await.unwrap(),
        Decimal::new(3000, 2)
    );
    assert_eq!(open.status, ReservationStatus::Confirmed);
    assert_eq!(service.get_reservations_by_parking_lot(lot.id).await.unwrap().len(), 2);
    assert_counter_consistent(&service, lot.id).await;
}

async fn one_active_reservation_per_spot(service: Arc<dyn ParkingService>) {
    let lot = lot(&service, 1).await;
    let spot_id = service.get_available_spots(lot.id).await.unwrap()[0].id;

    for _ in 0..3 {
        let reservation = service.create_reservation(request(spot_id, 1)).await.unwrap();
        assert!(service.create_reservation(request(spot_id, 1)).await.is_err());
        service.cancel_reservation(reservation.id).await.unwrap();
    }

    let last = service.create_reservation(request(spot_id, 1)).await.unwrap();
    let active: Vec<_> = service
        .get_reservations_by_parking_lot(lot.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.is_active())
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, last.id);

    let by_email = service
        .get_reservations_by_user_email("Yasmine@Example.com")
        .await
        .unwrap();
    assert_eq!(by_email.len(), 1);
    assert_eq!(by_email[0].id, last.id);
}

async fn manual_override_recounts_the_lot(service: Arc<dyn ParkingService>) {
    let lot = lot(&service, 3).await;
    let spots = service.get_available_spots(lot.id).await.unwrap();

    let spot = service
        .update_spot_status(spots[0].id, SpotStatus::Maintenance)
        .await
        .unwrap();
    assert_eq!(spot.status, SpotStatus::Maintenance);
    assert_eq!(service.get_parking_lot_by_id(lot.id).await.unwrap().available_spots, 2);
    assert_eq!(
        service
            .find_by_parking_lot_id_and_status(lot.id, SpotStatus::Maintenance)
            .await
            .unwrap()
            .len(),
        1
    );

    assert!(matches!(
        service.update_spot_status(spots[0].id, SpotStatus::Maintenance).await,
        Err(DomainError::StateConflict(_))
    ));

    service
        .update_spot_status(spots[0].id, SpotStatus::Available)
        .await
        .unwrap();
    assert_eq!(service.get_parking_lot_by_id(lot.id).await.unwrap().available_spots, 3);
    assert_counter_consistent(&service, lot.id).await;
}

async fn overdue_reservations_expire(service: Arc<dyn ParkingService>) {
    let lot = lot(&service, 2).await;
    let spots = service.get_available_spots(lot.id).await.unwrap();

    let mut stale = request(spots[0].id, 1);
    stale.start_time = Utc::now() - Duration::hours(3);
    let stale = service.create_reservation(stale).await.unwrap();
    let fresh = service.create_reservation(request(spots[1].id, 2)).await.unwrap();

    let expired = service.expire_reservations(Utc::now()).await.unwrap();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].id, stale.id);
    assert_eq!(expired[0].status, ReservationStatus::Expired);

    assert_eq!(
        service.get_spot_by_id(spots[0].id).await.unwrap().status,
        SpotStatus::Available
    );
    assert_eq!(
        service.get_reservation_by_id(fresh.id).await.unwrap().status,
        ReservationStatus::Confirmed
    );
    assert!(service.expire_reservations(Utc::now()).await.unwrap().is_empty());
    assert_counter_consistent(&service, lot.id).await;
}

async fn lot_fills_and_reopens(service: Arc<dyn ParkingService>) {
    let lot = lot(&service, 2).await;
    let spots = service.get_available_spots(lot.id).await.unwrap();

    for spot in &spots {
        service.simulate_car_entry(spot.id).await.unwrap();
    }
    let full = service.get_parking_lot_by_id(lot.id).await.unwrap();
    assert_eq!(full.status, LotStatus::Full);
    assert!(service.get_active_parking_lots().await.unwrap().is_empty());
    assert_eq!(service.get_occupancy_rate(lot.id).await.unwrap(), 100.0);

    service.simulate_car_exit(spots[0].id).await.unwrap();
    let reopened = service.get_parking_lot_by_id(lot.id).await.unwrap();
    assert_eq!(reopened.status, LotStatus::Active);
    assert_eq!(reopened.available_spots, 1);

    let closed = service
        .set_parking_lot_status(lot.id, LotStatus::Closed)
        .await
        .unwrap();
    assert_eq!(closed.status, LotStatus::Closed);
    assert_eq!(service.get_total_available_spots().await.unwrap(), 0);
    assert!(matches!(
        service.set_parking_lot_status(lot.id, LotStatus::Full).await,
        Err(DomainError::Validation(_))
    ));
}

async fn unknown_ids_are_not_found(service: Arc<dyn ParkingService>) {
    assert!(matches!(
        service.get_parking_lot_by_id(404).await,
        Err(DomainError::NotFound { .. })
    ));
    assert!(matches!(
        service.get_spot_by_id(404).await,
        Err(DomainError::NotFound { .. })
    ));
    assert!(matches!(
        service.cancel_reservation(404).await,
        Err(DomainError::NotFound { .. })
    ));
    assert!(matches!(
        service.simulate_car_entry(404).await,
        Err(DomainError::NotFound { .. })
    ));
    assert!(service.get_all_spots_by_parking_lot(404).await.unwrap().is_empty());
    assert_eq!(service.count_available_spots(404).await.unwrap(), 0);
    assert_eq!(
        service.get_total_revenue_by_parking_lot_id(404).await.unwrap(),
        Decimal::ZERO
    );
}

async fn exit_after_check_in_completes_the_reservation(service: Arc<dyn ParkingService>) {
    let lot = lot(&service, 1).await;
    let spot_id = service.get_available_spots(lot.id).await.unwrap()[0].id;
    let reservation = service.create_reservation(request(spot_id, 2)).await.unwrap();
    service.check_in(reservation.id).await.unwrap();

    assert!(service.simulate_car_exit(spot_id).await.unwrap());
    let settled = service.get_reservation_by_id(reservation.id).await.unwrap();
    assert_eq!(settled.status, ReservationStatus::Completed);
    assert!(settled.check_out_time.is_some());
    assert_eq!(
        service.get_total_revenue_by_parking_lot_id(lot.id).await.unwrap(),
        Decimal::new(2000, 2)
    );
    assert!(matches!(
        service.check_out(reservation.id).await,
        Err(DomainError::StateConflict(_))
    ));

    let next = service.create_reservation(request(spot_id, 1)).await.unwrap();
    assert_eq!(next.status, ReservationStatus::Confirmed);
    assert_counter_consistent(&service, lot.id).await;
}

async fn exit_without_check_in_cancels_the_reservation(service: Arc<dyn ParkingService>) {
    let lot = lot(&service, 1).await;
    let spot_id = service.get_available_spots(lot.id).await.unwrap()[0].id;
    let reservation = service.create_reservation(request(spot_id, 2)).await.unwrap();

    assert!(service.simulate_car_exit(spot_id).await.unwrap());
    let settled = service.get_reservation_by_id(reservation.id).await.unwrap();
    assert_eq!(settled.status, ReservationStatus::Cancelled);
    assert!(settled.cancelled_at.is_some());
    assert_eq!(
        service.get_spot_by_id(spot_id).await.unwrap().status,
        SpotStatus::Available
    );
    assert_eq!(
        service.get_total_revenue_by_parking_lot_id(lot.id).await.unwrap(),
        Decimal::ZERO
    );

    service.create_reservation(request(spot_id, 1)).await.unwrap();
    assert_counter_consistent(&service, lot.id).await;
}

async fn override_cancels_the_reservation(service: Arc<dyn ParkingService>) {
    let lot = lot(&service, 2).await;
    let spot_id = service.get_available_spots(lot.id).await.unwrap()[0].id;
    let reservation = service.create_reservation(request(spot_id, 2)).await.unwrap();

    service
        .update_spot_status(spot_id, SpotStatus::Maintenance)
        .await
        .unwrap();
    let settled = service.get_reservation_by_id(reservation.id).await.unwrap();
    assert_eq!(settled.status, ReservationStatus::Cancelled);
    assert!(!settled.is_active());
    assert_eq!(service.get_parking_lot_by_id(lot.id).await.unwrap().available_spots, 1);

    service
        .update_spot_status(spot_id, SpotStatus::Available)
        .await
        .unwrap();
    let next = service.create_reservation(request(spot_id, 1)).await.unwrap();
    assert_eq!(next.spot_id, spot_id);
    assert_counter_consistent(&service, lot.id).await;
}

async fn oversized_window_is_rejected(service: Arc<dyn ParkingService>) {
    let lot = lot(&service, 1).await;
    let spot_id = service.get_available_spots(lot.id).await.unwrap()[0].id;

    let oversized = service.create_reservation(request(spot_id, u32::MAX)).await;
    assert!(matches!(oversized, Err(DomainError::Validation(_))));
    assert_eq!(
        service.get_spot_by_id(spot_id).await.unwrap().status,
        SpotStatus::Available
    );
    assert_counter_consistent(&service, lot.id).await;
}

async fn sub_cent_rates_are_rejected(service: Arc<dyn ParkingService>) {
    let lot = NewParkingLot::new("Gauthier", 2, Decimal::new(12345, 3));
    assert!(matches!(
        service.create_parking_lot(lot).await,
        Err(DomainError::Validation(_))
    ));
    assert!(service.get_all_parking_lots().await.unwrap().is_empty());

    let lot = service
        .create_parking_lot(NewParkingLot::new("Gauthier", 2, Decimal::new(1250, 2)))
        .await
        .unwrap();
    let stored = service.get_parking_lot_by_id(lot.id).await.unwrap();
    assert_eq!(stored.hourly_rate, Decimal::new(1250, 2));
}
