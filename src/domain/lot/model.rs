//! Parking lot domain entity
//!
//! The lot's `available_spots` is a materialized view over its spots'
//! statuses. The ACTIVE/FULL derivation lives here so every store applies
//! it the same way inside its atomic section.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::spot::SpotStatus;
use crate::domain::{DomainError, DomainResult};

/// Lot operating status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LotStatus {
    Active,
    Full,
    Maintenance,
    Closed,
}

impl LotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Full => "FULL",
            Self::Maintenance => "MAINTENANCE",
            Self::Closed => "CLOSED",
        }
    }

    /// MAINTENANCE and CLOSED are operator overrides; occupancy never changes them.
    pub fn is_manual_override(&self) -> bool {
        matches!(self, Self::Maintenance | Self::Closed)
    }
}

impl FromStr for LotStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "FULL" => Ok(Self::Full),
            "MAINTENANCE" => Ok(Self::Maintenance),
            "CLOSED" => Ok(Self::Closed),
            other => Err(DomainError::Validation(format!(
                "unknown lot status '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for LotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a committed spot change moves the lot's available counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterAdjustment {
    /// Spot did not cross into or out of AVAILABLE
    Unchanged,
    /// Spot became AVAILABLE
    Increment,
    /// Spot left AVAILABLE
    Decrement,
    /// Recount from the literal spot statuses (manual override path)
    Recount,
}

impl CounterAdjustment {
    /// Incremental adjustment for a spot moving `from` → `to`.
    pub fn for_transition(from: SpotStatus, to: SpotStatus) -> Self {
        match (from == SpotStatus::Available, to == SpotStatus::Available) {
            (false, true) => Self::Increment,
            (true, false) => Self::Decrement,
            _ => Self::Unchanged,
        }
    }
}

/// A capacity- and rate-bearing container of spots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingLot {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub total_spots: u32,
    pub available_spots: u32,
    pub status: LotStatus,
    pub hourly_rate: Decimal,
    pub opening_time: String,
    pub closing_time: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ParkingLot {
    pub fn is_open(&self) -> bool {
        self.status == LotStatus::Active
    }

    pub fn has_available_spots(&self) -> bool {
        self.available_spots > 0
    }

    pub fn occupied_spots(&self) -> u32 {
        self.total_spots.saturating_sub(self.available_spots)
    }

    /// Settle the counter on `available` (capped at `total_spots`) and
    /// re-derive ACTIVE/FULL. Returns the previous status if it changed.
    pub fn settle_available(&mut self, available: u32, at: DateTime<Utc>) -> Option<LotStatus> {
        let after = available.min(self.total_spots);
        self.available_spots = after;
        self.updated_at = at;

        let previous = self.status;
        if !self.status.is_manual_override() {
            self.status = if after == 0 && self.total_spots > 0 {
                LotStatus::Full
            } else {
                LotStatus::Active
            };
        }
        (previous != self.status).then_some(previous)
    }

    /// Apply an incremental adjustment. `Recount` needs the literal count and
    /// is handled by [`ParkingLot::settle_available`] directly.
    pub fn adjust(&mut self, adjustment: CounterAdjustment, at: DateTime<Utc>) -> Option<LotStatus> {
        match adjustment {
            CounterAdjustment::Increment => self.settle_available(self.available_spots + 1, at),
            CounterAdjustment::Decrement => {
                self.settle_available(self.available_spots.saturating_sub(1), at)
            }
            CounterAdjustment::Unchanged | CounterAdjustment::Recount => None,
        }
    }

    /// Operator override. ACTIVE on an exhausted lot lands on FULL.
    pub fn override_status(&mut self, status: LotStatus, at: DateTime<Utc>) -> DomainResult<()> {
        self.status = match status {
            LotStatus::Full => {
                return Err(DomainError::Validation(
                    "FULL is derived from occupancy and cannot be set manually".into(),
                ))
            }
            LotStatus::Active if self.available_spots == 0 && self.total_spots > 0 => {
                LotStatus::Full
            }
            other => other,
        };
        self.updated_at = at;
        Ok(())
    }
}

fn validate_hhmm(value: &str) -> Result<(), ValidationError> {
    let valid = value.is_ascii()
        && value.len() == 5
        && value.as_bytes()[2] == b':'
        && matches!(value[..2].parse::<u8>(), Ok(h) if h < 24)
        && matches!(value[3..].parse::<u8>(), Ok(m) if m < 60);
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("hh_mm"))
    }
}

fn default_opening_time() -> String {
    "00:00".to_string()
}

fn default_closing_time() -> String {
    "23:59".to_string()
}

fn default_hourly_rate() -> Decimal {
    Decimal::new(1000, 2)
}

/// Request to create a lot
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewParkingLot {
    #[validate(length(min = 1, max = 100, message = "name must be 1–100 characters"))]
    pub name: String,
    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,
    #[validate(length(min = 1, max = 100, message = "city must be 1–100 characters"))]
    pub city: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    pub total_spots: u32,
    #[serde(default = "default_hourly_rate")]
    pub hourly_rate: Decimal,
    #[serde(default = "default_opening_time")]
    #[validate(custom(function = "validate_hhmm"))]
    pub opening_time: String,
    #[serde(default = "default_closing_time")]
    #[validate(custom(function = "validate_hhmm"))]
    pub closing_time: String,
}

impl NewParkingLot {
    pub fn new(name: impl Into<String>, total_spots: u32, hourly_rate: Decimal) -> Self {
        Self {
            name: name.into(),
            address: "-".to_string(),
            city: "-".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            total_spots,
            hourly_rate,
            opening_time: default_opening_time(),
            closing_time: default_closing_time(),
        }
    }

    pub fn check(&self) -> DomainResult<()> {
        self.validate()?;
        if self.hourly_rate.is_sign_negative() {
            return Err(DomainError::Validation(
                "hourly_rate must not be negative".into(),
            ));
        }
        if self.hourly_rate.normalize().scale() > 2 {
            return Err(DomainError::Validation(format!(
                "hourly_rate {} has more than 2 decimal places",
                self.hourly_rate
            )));
        }
        Ok(())
    }

    /// Fresh lot record: every spot available, status ACTIVE.
    pub fn into_lot(self, id: i32, now: DateTime<Utc>) -> ParkingLot {
        ParkingLot {
            id,
            name: self.name,
            address: self.address,
            city: self.city,
            latitude: self.latitude,
            longitude: self.longitude,
            total_spots: self.total_spots,
            available_spots: self.total_spots,
            status: LotStatus::Active,
            hourly_rate: self.hourly_rate,
            opening_time: self.opening_time,
            closing_time: self.closing_time,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Lot plus literal per-status spot counts, read in one unit
#[derive(Debug, Clone, PartialEq)]
pub struct LotOccupancy {
    pub lot: ParkingLot,
    pub available: u64,
    pub reserved: u64,
    pub occupied: u64,
    pub maintenance: u64,
}

impl LotOccupancy {
    /// Counter matches the literal AVAILABLE count
    pub fn is_consistent(&self) -> bool {
        u64::from(self.lot.available_spots) == self.available
    }

    /// Percentage of spots not AVAILABLE; 0.0 for a lot without spots
    pub fn occupancy_rate(&self) -> f64 {
        let total = self.lot.total_spots as f64;
        if total == 0.0 {
            return 0.0;
        }
        (total - self.available as f64) * 100.0 / total
    }
}

// ── Tests ──────────────────────────────────────────────────────
