//! Parking spot domain entity

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Spot status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpotStatus {
    Available,
    Reserved,
    Occupied,
    Maintenance,
}

impl SpotStatus {
    pub const ALL: [SpotStatus; 4] = [
        SpotStatus::Available,
        SpotStatus::Reserved,
        SpotStatus::Occupied,
        SpotStatus::Maintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Reserved => "RESERVED",
            Self::Occupied => "OCCUPIED",
            Self::Maintenance => "MAINTENANCE",
        }
    }

    /// Transition table for spot status.
    ///
    /// AVAILABLE→OCCUPIED is a walk-in arrival. A same-status move is never legal.
    pub fn can_transition_to(self, next: SpotStatus) -> bool {
        use SpotStatus::*;
        match (self, next) {
            (from, to) if from == to => false,
            (_, Maintenance) => true,
            (Available, Reserved) | (Available, Occupied) => true,
            (Reserved, Occupied) | (Reserved, Available) => true,
            (Occupied, Available) => true,
            (Maintenance, Available) => true,
            _ => false,
        }
    }
}

impl FromStr for SpotStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AVAILABLE" => Ok(Self::Available),
            "RESERVED" => Ok(Self::Reserved),
            "OCCUPIED" => Ok(Self::Occupied),
            "MAINTENANCE" => Ok(Self::Maintenance),
            other => Err(DomainError::Validation(format!(
                "unknown spot status '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for SpotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Physical kind of spot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpotType {
    #[default]
    Standard,
    Compact,
    Large,
    Handicapped,
    Electric,
    Vip,
}

impl SpotType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "STANDARD",
            Self::Compact => "COMPACT",
            Self::Large => "LARGE",
            Self::Handicapped => "HANDICAPPED",
            Self::Electric => "ELECTRIC",
            Self::Vip => "VIP",
        }
    }
}

impl FromStr for SpotType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STANDARD" => Ok(Self::Standard),
            "COMPACT" => Ok(Self::Compact),
            "LARGE" => Ok(Self::Large),
            "HANDICAPPED" => Ok(Self::Handicapped),
            "ELECTRIC" => Ok(Self::Electric),
            "VIP" => Ok(Self::Vip),
            other => Err(DomainError::Validation(format!(
                "unknown spot type '{}'",
                other
            ))),
        }
    }
}

/// An individually addressable parking space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingSpot {
    pub id: i32,
    /// Owning lot, fixed for the spot's lifetime
    pub lot_id: i32,
    /// Human label, unique per lot ("A-1")
    pub spot_number: String,
    pub status: SpotStatus,
    pub spot_type: SpotType,
    pub floor_number: i32,
    pub section: Option<String>,
    pub is_accessible: bool,
    pub is_covered: bool,
    pub is_electric_charging: bool,
    pub last_occupied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ParkingSpot {
    pub fn is_available(&self) -> bool {
        self.status == SpotStatus::Available
    }

    /// Lot name + spot number, e.g. "Agdal - A-1"
    pub fn full_name(&self, lot_name: &str) -> String {
        format!("{} - {}", lot_name, self.spot_number)
    }
}

/// Spot record before the store assigns its id
#[derive(Debug, Clone, PartialEq)]
pub struct NewParkingSpot {
    pub spot_number: String,
    pub spot_type: SpotType,
    pub floor_number: i32,
    pub section: Option<String>,
    pub is_accessible: bool,
    pub is_covered: bool,
    pub is_electric_charging: bool,
}

impl NewParkingSpot {
    /// Spots generated for a new lot: "A-1".."A-n", floor 1, covered, standard.
    pub fn generate(count: u32) -> Vec<NewParkingSpot> {
        (1..=count)
            .map(|i| NewParkingSpot {
                spot_number: format!("A-{}", i),
                spot_type: SpotType::Standard,
                floor_number: 1,
                section: Some("A".to_string()),
                is_accessible: false,
                is_covered: true,
                is_electric_charging: false,
            })
            .collect()
    }

    pub fn into_spot(self, id: i32, lot_id: i32, now: DateTime<Utc>) -> ParkingSpot {
        ParkingSpot {
            id,
            lot_id,
            spot_number: self.spot_number,
            status: SpotStatus::Available,
            spot_type: self.spot_type,
            floor_number: self.floor_number,
            section: self.section,
            is_accessible: self.is_accessible,
            is_covered: self.is_covered,
            is_electric_charging: self.is_electric_charging,
            last_occupied_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use SpotStatus::*;

    #[test]
    fn allowed_transitions() {
        assert!(Available.can_transition_to(Reserved));
        assert!(Available.can_transition_to(Occupied));
        assert!(Reserved.can_transition_to(Occupied));
        assert!(Reserved.can_transition_to(Available));
        assert!(Occupied.can_transition_to(Available));
        assert!(Maintenance.can_transition_to(Available));
        for from in [Available, Reserved, Occupied] {
            assert!(from.can_transition_to(Maintenance));
        }
    }

    #[test]
    fn rejected_transitions() {
        assert!(!Occupied.can_transition_to(Reserved));
        assert!(!Maintenance.can_transition_to(Reserved));
        assert!(!Maintenance.can_transition_to(Occupied));
        for s in SpotStatus::ALL {
            assert!(!s.can_transition_to(s), "{} -> {} must be rejected", s, s);
        }
    }

    #[test]
    fn parse_status_case_insensitive() {
        assert_eq!("occupied".parse::<SpotStatus>().unwrap(), Occupied);
        assert_eq!(" MAINTENANCE ".parse::<SpotStatus>().unwrap(), Maintenance);
        assert!(matches!(
            "BROKEN".parse::<SpotStatus>(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn generated_spots_are_numbered_from_one() {
        let spots = NewParkingSpot::generate(3);
        let numbers: Vec<_> = spots.iter().map(|s| s.spot_number.as_str()).collect();
        assert_eq!(numbers, vec!["A-1", "A-2", "A-3"]);
        assert!(spots.iter().all(|s| s.is_covered && s.floor_number == 1));

        let spot = spots[0].clone().into_spot(7, 2, Utc::now());
        assert_eq!(spot.status, Available);
        assert_eq!(spot.full_name("Agdal"), "Agdal - A-1");
    }
}
