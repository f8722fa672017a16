//! Stock-domain error model.

use thiserror::Error;

use crate::reservation::ReservationStatus;

/// Result type used across the stock domain.
pub type StockResult<T> = Result<T, StockError>;

/// Deterministic failures of the stock ledger and reservation state machine.
///
/// Infrastructure concerns (storage, publication) belong elsewhere. Callers
/// decide which of these are expected business outcomes and which are misuse;
/// the aggregate only guarantees that a returned error means no field was
/// mutated (events may still have been buffered where documented).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockError {
    /// Quantity arithmetic would go below zero; callers must pre-check.
    #[error("quantity arithmetic would go negative")]
    NegativeQuantity,

    /// Quantity arithmetic exceeded the representable range.
    #[error("quantity arithmetic overflowed")]
    QuantityOverflow,

    /// Mutation attempted on a deactivated product.
    #[error("product is inactive")]
    ProductInactive,

    /// Reserve rejected: not enough available stock.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u64, available: u64 },

    /// Release rejected: more units requested than currently reserved.
    #[error("cannot release {requested} units: only {reserved} reserved")]
    CannotRelease { requested: u64, reserved: u64 },

    /// Confirm rejected: more units requested than currently reserved.
    #[error("cannot confirm {requested} units: only {reserved} reserved")]
    CannotConfirm { requested: u64, reserved: u64 },

    /// Administrative correction would leave fewer units than are reserved.
    #[error("stock correction to {requested} would fall below {reserved} reserved units")]
    CorrectionBelowReserved { requested: u64, reserved: u64 },

    /// Release/confirm attempted on a reservation that is no longer active.
    #[error("reservation is {actual}, expected active")]
    InvalidReservationState { actual: ReservationStatus },
}
