pub mod events;
pub mod parking;
pub mod services;

// Re-export key types for convenience
pub use events::{create_event_bus, Event, EventBus, EventSubscriber, SharedEventBus};
pub use parking::{AllocationCoordinator, LotAggregate, ReservationLedger, SpotRegistry};
pub use services::{start_reservation_expiry_task, DeadlineParkingService, ParkingServiceImpl};
