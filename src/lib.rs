//! # Parking allocation core
//!
//! Spot allocation and reservation management for parking lots.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Core business entities, state machines and store traits
//! - **application**: The allocation coordinator, service facade and event bus
//! - **infrastructure**: Storage backends (SeaORM/SQLite and in-memory)
//! - **server**: Runtime wiring, background tasks and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export storage types for easy access
pub use infrastructure::{init_database, DatabaseConfig, InMemoryParkingStore, SeaOrmParkingStore};

// Re-export the service surface
pub use application::{create_event_bus, AllocationCoordinator, Event, EventBus, SharedEventBus};
pub use domain::{DomainError, DomainResult, ParkingService, ParkingStore};
