//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories plus the transactional `SeaOrmParkingStore`.

mod convert;
pub mod lot_repository;
pub mod parking_store;
pub mod reservation_repository;
pub mod spot_repository;

pub use lot_repository::SeaOrmLotRepository;
pub use parking_store::SeaOrmParkingStore;
pub use reservation_repository::SeaOrmReservationRepository;
pub use spot_repository::SeaOrmSpotRepository;
