//! Reservation aggregate
//!
//! Contains the Reservation entity, window derivation, the inbound request
//! type, and the read-side repository interface.

pub mod model;
pub mod repository;

pub use model::{
    NewReservation, PaymentStatus, Reservation, ReservationRequest, ReservationStatus,
    ReservationWindow,
};
pub use repository::ReservationRepository;
