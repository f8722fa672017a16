//! Inventory domain module: the stock ledger and reservation state machine.
//!
//! This crate contains the business rules for per-product stock tracking,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no
//! storage). Mutations buffer domain events internally; the persistence
//! layer drains and publishes them only after a successful commit.

pub mod error;
pub mod product;
pub mod quantity;
pub mod reservation;

pub use error::{StockError, StockResult};
pub use product::{
    ArtisanId, CategoryId, LowStock, Money, NewProduct, OutOfStock, Product, ProductId,
    ProductSnapshot, Sku, StockCorrection, StockDeducted, StockEvent, StockReleased,
    StockReplenished, StockReserved, StockStatus, PRODUCT_AGGREGATE_TYPE,
};
pub use quantity::Quantity;
pub use reservation::{
    Reservation, ReservationId, ReservationItem, ReservationStatus, DEFAULT_RESERVATION_TTL_MINUTES,
    RESERVATION_EXPIRED_REASON,
};
