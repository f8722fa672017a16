//! Infrastructure layer: persistence contracts, saga-facing operations and
//! reservation expiry sweeping.
//!
//! The in-memory implementations here are test fixtures with real contract
//! semantics (atomic per-aggregate saves, optimistic concurrency, publish
//! after commit); production deployments swap in backends with the same
//! guarantees.

pub mod operations;
pub mod repository;
pub mod reservations;
pub mod sweeper;

pub use operations::{
    AdjustStock, BulkInventoryReport, ConfirmOutcome, ConfirmStock, InventoryOperations,
    InventoryReport, OperationError, ReleaseOutcome, ReleaseStock, ReplenishStock,
    ReservationReceipt, ReserveOutcome, ReserveStock, StockSnapshot, StockStatusTally,
    UpdateStock,
};
pub use repository::{InMemoryProductRepository, ProductRepository, RepositoryError};
pub use reservations::{InMemoryReservationStore, ReservationStore};
pub use sweeper::{ReservationSweeper, SweepReport};
