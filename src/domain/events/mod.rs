//! Domain events
//!
//! Facts published after a change set commits. The EventBus implementation
//! lives in `application::events`.

pub mod types;

pub use types::{
    Event, EventMessage, LotCreatedEvent, LotStatusChangedEvent, ReservationCreatedEvent,
    ReservationStatusChangedEvent, SpotStatusChangedEvent,
};
