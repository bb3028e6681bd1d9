//! Parking spot aggregate
//!
//! Contains the ParkingSpot entity, its status transition table, and the
//! read-side repository interface. Writes go through `ParkingStore::apply`.

pub mod model;
pub mod repository;

pub use model::{NewParkingSpot, ParkingSpot, SpotStatus, SpotType};
pub use repository::ParkingSpotRepository;
