//! Application services

mod deadline;
mod parking_service;
mod reservation_expiry;

pub use deadline::DeadlineParkingService;
pub use parking_service::ParkingServiceImpl;
pub use reservation_expiry::start_reservation_expiry_task;
