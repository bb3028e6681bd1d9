//! Domain ports
//!
//! `ParkingService` is the one contract callers use. Every mutating method
//! goes through the allocation coordinator; reads go straight to the store.

pub mod service;

pub use service::ParkingService;
