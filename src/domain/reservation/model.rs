//! Reservation domain entity

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::{DomainError, DomainResult};

/// Reservation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    /// Created, waiting for confirmation
    Pending,
    /// Holds the spot
    Confirmed,
    /// Cancelled by user or operator
    Cancelled,
    /// Checked out
    Completed,
    /// Window ended without check-in
    Expired,
    NoShow,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
            Self::Completed => "COMPLETED",
            Self::Expired => "EXPIRED",
            Self::NoShow => "NO_SHOW",
        }
    }

    /// PENDING and CONFIRMED hold a claim on the spot
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

impl FromStr for ReservationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "CANCELLED" => Ok(Self::Cancelled),
            "COMPLETED" => Ok(Self::Completed),
            "EXPIRED" => Ok(Self::Expired),
            "NO_SHOW" => Ok(Self::NoShow),
            other => Err(DomainError::Validation(format!(
                "unknown reservation status '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
    Refunded,
    Pending,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "UNPAID",
            Self::Paid => "PAID",
            Self::Refunded => "REFUNDED",
            Self::Pending => "PENDING",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNPAID" => Ok(Self::Unpaid),
            "PAID" => Ok(Self::Paid),
            "REFUNDED" => Ok(Self::Refunded),
            "PENDING" => Ok(Self::Pending),
            other => Err(DomainError::Validation(format!(
                "unknown payment status '{}'",
                other
            ))),
        }
    }
}

/// Resolved booking window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationWindow {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_hours: u32,
}

impl ReservationWindow {
    pub const MIN_HOURS: u32 = 1;
    pub const MAX_HOURS: u32 = 24;

    /// Derive the missing half of the window.
    ///
    /// With an end time the duration is the whole hours between start and
    /// end, at least one; the end time wins if both are given.
    pub fn resolve(
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
        duration_hours: Option<u32>,
    ) -> DomainResult<Self> {
        let (end_time, duration_hours) = match (end_time, duration_hours) {
            (Some(end), _) => {
                if end <= start_time {
                    return Err(DomainError::Validation(
                        "end_time must be after start_time".into(),
                    ));
                }
                let hours = (end - start_time).num_hours().max(1);
                (end, u32::try_from(hours).unwrap_or(u32::MAX))
            }
            (None, Some(hours)) => {
                Self::check_hours(hours)?;
                let end = start_time
                    .checked_add_signed(Duration::hours(i64::from(hours)))
                    .ok_or_else(|| {
                        DomainError::Validation(format!(
                            "start_time {} plus {} hours is out of range",
                            start_time, hours
                        ))
                    })?;
                (end, hours)
            }
            (None, None) => {
                return Err(DomainError::Validation(
                    "either end_time or duration_hours is required".into(),
                ))
            }
        };

        Self::check_hours(duration_hours)?;

        Ok(Self {
            start_time,
            end_time,
            duration_hours,
        })
    }

    fn check_hours(hours: u32) -> DomainResult<()> {
        if !(Self::MIN_HOURS..=Self::MAX_HOURS).contains(&hours) {
            return Err(DomainError::Validation(format!(
                "duration must be between {} and {} hours, got {}",
                Self::MIN_HOURS,
                Self::MAX_HOURS,
                hours
            )));
        }
        Ok(())
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && start < self.end_time
    }
}

/// Inbound reservation request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReservationRequest {
    pub spot_id: i32,
    #[validate(length(min = 3, max = 100, message = "user_name must be 3–100 characters"))]
    pub user_name: String,
    #[validate(email(message = "invalid email"))]
    pub user_email: String,
    #[validate(length(min = 1, max = 20, message = "user_phone must be 1–20 characters"))]
    pub user_phone: String,
    #[validate(length(min = 1, max = 20, message = "license_plate must be 1–20 characters"))]
    pub license_plate: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_hours: Option<u32>,
}

impl ReservationRequest {
    pub fn window(&self) -> DomainResult<ReservationWindow> {
        ReservationWindow::resolve(self.start_time, self.end_time, self.duration_hours)
    }
}

/// Reservation ready to persist; the store assigns the id
#[derive(Debug, Clone, PartialEq)]
pub struct NewReservation {
    pub spot_id: i32,
    pub lot_id: i32,
    pub user_name: String,
    pub user_email: String,
    pub user_phone: String,
    pub license_plate: String,
    pub window: ReservationWindow,
    pub status: ReservationStatus,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl NewReservation {
    pub fn into_reservation(self, id: i32) -> Reservation {
        Reservation {
            id,
            spot_id: self.spot_id,
            lot_id: self.lot_id,
            user_name: self.user_name,
            user_email: self.user_email,
            user_phone: self.user_phone,
            license_plate: self.license_plate,
            start_time: self.window.start_time,
            end_time: self.window.end_time,
            duration_hours: self.window.duration_hours,
            status: self.status,
            total_amount: self.total_amount,
            payment_status: PaymentStatus::Unpaid,
            check_in_time: None,
            check_out_time: None,
            cancellation_reason: None,
            cancelled_at: None,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// A time-bounded claim by a user on one spot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i32,
    pub spot_id: i32,
    pub lot_id: i32,
    pub user_name: String,
    pub user_email: String,
    pub user_phone: String,
    pub license_plate: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_hours: u32,
    pub status: ReservationStatus,
    pub total_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn has_checked_in(&self) -> bool {
        self.check_in_time.is_some()
    }

    /// Active, not checked in, and past its end time
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && !self.has_checked_in() && now > self.end_time
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && start < self.end_time
    }

    fn conflict(&self, action: &str) -> DomainError {
        DomainError::StateConflict(format!(
            "reservation {} is {} and cannot be {}",
            self.id, self.status, action
        ))
    }

    pub fn confirm(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.status != ReservationStatus::Pending {
            return Err(self.conflict("confirmed"));
        }
        self.status = ReservationStatus::Confirmed;
        self.updated_at = at;
        Ok(())
    }

    pub fn cancel(&mut self, reason: impl Into<String>, at: DateTime<Utc>) -> DomainResult<()> {
        if !self.is_active() {
            return Err(self.conflict("cancelled"));
        }
        self.status = ReservationStatus::Cancelled;
        self.cancellation_reason = Some(reason.into());
        self.cancelled_at = Some(at);
        self.updated_at = at;
        Ok(())
    }

    pub fn check_in(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.status != ReservationStatus::Confirmed || self.has_checked_in() {
            return Err(self.conflict("checked in"));
        }
        self.check_in_time = Some(at);
        self.updated_at = at;
        Ok(())
    }

    pub fn complete(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.status != ReservationStatus::Confirmed || !self.has_checked_in() {
            return Err(self.conflict("completed"));
        }
        self.status = ReservationStatus::Completed;
        self.check_out_time = Some(at);
        self.updated_at = at;
        Ok(())
    }

    pub fn expire(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if !self.is_overdue(at) {
            return Err(self.conflict("expired"));
        }
        self.status = ReservationStatus::Expired;
        self.updated_at = at;
        Ok(())
    }

    /// Minutes left in the window; 0 once finished or cancelled
    pub fn remaining_minutes(&self, now: DateTime<Utc>) -> i64 {
        if !self.is_active() {
            return 0;
        }
        (self.end_time - now).num_minutes().max(0)
    }
}

// ── Tests ──────────────────────────────────────────────────────
