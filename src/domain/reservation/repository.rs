//! Reservation repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::model::Reservation;
use crate::domain::DomainResult;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Find reservation by ID
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Reservation>>;

    /// All reservations of a lot, any status, ordered by id
    async fn find_by_lot(&self, lot_id: i32) -> DomainResult<Vec<Reservation>>;

    /// PENDING/CONFIRMED reservations of a user, newest start first
    async fn find_active_by_user_email(&self, email: &str) -> DomainResult<Vec<Reservation>>;

    /// The PENDING/CONFIRMED reservation holding a spot, if any
    async fn find_active_for_spot(&self, spot_id: i32) -> DomainResult<Option<Reservation>>;

    /// Active, not checked in, and `end_time < now`
    async fn find_expired(&self, now: DateTime<Utc>) -> DomainResult<Vec<Reservation>>;

    /// Sum of `total_amount` over COMPLETED reservations; zero when none
    async fn total_revenue_by_lot(&self, lot_id: i32) -> DomainResult<Decimal>;
}
