//! In-process storage backend

mod memory;

pub use memory::{
    InMemoryParkingStore, MemoryLotRepository, MemoryReservationRepository, MemorySpotRepository,
};
