pub mod events;
pub mod lot;
pub mod ports;
pub mod repositories;
pub mod reservation;
pub mod spot;
pub mod transition;

// Re-export commonly used types
pub use lot::{CounterAdjustment, LotOccupancy, LotStatus, NewParkingLot, ParkingLot};
pub use ports::ParkingService;
pub use repositories::{DomainResult, ParkingStore};
pub use reservation::{
    NewReservation, PaymentStatus, Reservation, ReservationRequest, ReservationStatus,
    ReservationWindow,
};
pub use spot::{NewParkingSpot, ParkingSpot, SpotStatus, SpotType};
pub use transition::{Applied, ChangeSet, ReservationWrite};

pub use crate::shared::errors::DomainError;
