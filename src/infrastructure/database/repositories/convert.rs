//! Row ↔ domain conversion helpers

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::domain::{DomainError, DomainResult, ParkingLot, ParkingSpot, Reservation};
use crate::infrastructure::database::entities::{parking_lot, parking_spot, reservation};

pub(super) fn to_cents(amount: Decimal) -> DomainResult<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .ok_or_else(|| DomainError::Validation(format!("amount {} out of range", amount)))
}

pub(super) fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

fn to_u32(value: i32, column: &str) -> DomainResult<u32> {
    u32::try_from(value)
        .map_err(|_| DomainError::Storage(format!("negative value {} in {}", value, column)))
}

pub(super) fn to_i32(value: u32, column: &str) -> DomainResult<i32> {
    i32::try_from(value)
        .map_err(|_| DomainError::Validation(format!("{} too large for {}", value, column)))
}

pub(super) fn lot_to_domain(m: parking_lot::Model) -> DomainResult<ParkingLot> {
    Ok(ParkingLot {
        id: m.id,
        name: m.name,
        address: m.address,
        city: m.city,
        latitude: m.latitude,
        longitude: m.longitude,
        total_spots: to_u32(m.total_spots, "parking_lots.total_spots")?,
        available_spots: to_u32(m.available_spots, "parking_lots.available_spots")?,
        status: m.status.parse()?,
        hourly_rate: from_cents(m.hourly_rate_cents),
        opening_time: m.opening_time,
        closing_time: m.closing_time,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

pub(super) fn spot_to_domain(m: parking_spot::Model) -> DomainResult<ParkingSpot> {
    Ok(ParkingSpot {
        id: m.id,
        lot_id: m.parking_lot_id,
        spot_number: m.spot_number,
        status: m.status.parse()?,
        spot_type: m.spot_type.parse()?,
        floor_number: m.floor_number,
        section: m.section,
        is_accessible: m.is_accessible,
        is_covered: m.is_covered,
        is_electric_charging: m.is_electric_charging,
        last_occupied_at: m.last_occupied_at,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

pub(super) fn reservation_to_domain(m: reservation::Model) -> DomainResult<Reservation> {
    Ok(Reservation {
        id: m.id,
        spot_id: m.parking_spot_id,
        lot_id: m.parking_lot_id,
        user_name: m.user_name,
        user_email: m.user_email,
        user_phone: m.user_phone,
        license_plate: m.license_plate,
        start_time: m.start_time,
        end_time: m.end_time,
        duration_hours: to_u32(m.duration_hours, "reservations.duration_hours")?,
        status: m.status.parse()?,
        total_amount: from_cents(m.total_amount_cents),
        payment_status: m.payment_status.parse()?,
        check_in_time: m.check_in_time,
        check_out_time: m.check_out_time,
        cancellation_reason: m.cancellation_reason,
        cancelled_at: m.cancelled_at,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

pub(super) fn collect<M, T>(
    rows: Vec<M>,
    convert: fn(M) -> DomainResult<T>,
) -> DomainResult<Vec<T>> {
    rows.into_iter().map(convert).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cents_round_trip_keeps_two_places() {
        assert_eq!(to_cents(Decimal::new(1250, 2)).unwrap(), 1250);
        assert_eq!(to_cents(Decimal::new(10, 0)).unwrap(), 1000);
        assert_eq!(from_cents(1250), Decimal::new(1250, 2));
        assert_eq!(to_cents(Decimal::new(12345, 3)).unwrap(), 1234);
    }

    #[test]
    fn negative_counts_are_storage_errors() {
        assert!(matches!(to_u32(-1, "x"), Err(DomainError::Storage(_))));
        assert!(matches!(to_i32(u32::MAX, "x"), Err(DomainError::Validation(_))));
    }
}
