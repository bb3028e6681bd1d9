//! Parking lot aggregate

pub mod model;
pub mod repository;

pub use model::{CounterAdjustment, LotOccupancy, LotStatus, NewParkingLot, ParkingLot};
pub use repository::ParkingLotRepository;
