//! Parking allocation core
//!
//! `SpotRegistry`, `LotAggregate` and `ReservationLedger` read state and
//! prepare change sets; `AllocationCoordinator` is the only component that
//! commits them.

mod coordinator;
mod lot_aggregate;
mod reservation_ledger;
mod spot_registry;

pub use coordinator::AllocationCoordinator;
pub use lot_aggregate::LotAggregate;
pub use reservation_ledger::ReservationLedger;
pub use spot_registry::SpotRegistry;
