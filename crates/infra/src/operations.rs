//! Saga-facing inventory operations (application-level orchestration).
//!
//! Each operation runs the same pipeline: validate input, load the product
//! fresh from the repository, invoke the aggregate, save (which flushes the
//! buffered events to the publisher), and report the outcome.
//!
//! Expected business outcomes (insufficient stock, over-release,
//! over-confirm) come back as structured `Rejected` variants so the saga
//! layer can branch without exception handling; misuse (bad input, unknown
//! id, wrong state) and infrastructure failures come back as
//! `OperationError`.
//!
//! Operations are not idempotent: replaying a call re-applies the delta.
//! `(saga_id, order_id, product_id, operation)` is the natural dedup key;
//! the deduplication ledger belongs to the saga layer, not here.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{info, warn};

use artisania_core::{OrderId, SagaId};
use artisania_inventory::{
    Money, Product, ProductId, Quantity, Reservation, ReservationId, ReservationItem, Sku,
    StockError, StockStatus, DEFAULT_RESERVATION_TTL_MINUTES,
};

use crate::repository::{ProductRepository, RepositoryError};
use crate::reservations::ReservationStore;

/// Reserve `quantity` units of a product for an order line item.
#[derive(Debug, Clone)]
pub struct ReserveStock {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub order_id: OrderId,
    pub saga_id: Option<SagaId>,
}

/// Give back previously reserved units (compensating action on cancel).
#[derive(Debug, Clone)]
pub struct ReleaseStock {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub order_id: OrderId,
    pub reason: String,
    pub saga_id: Option<SagaId>,
}

/// Convert reserved units into a permanent deduction (order completed).
#[derive(Debug, Clone)]
pub struct ConfirmStock {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub order_id: OrderId,
    pub saga_id: Option<SagaId>,
}

/// Restock from a supplier delivery.
#[derive(Debug, Clone)]
pub struct ReplenishStock {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub reason: String,
    pub saga_id: Option<SagaId>,
}

/// Administrative correction to an absolute stock value.
#[derive(Debug, Clone)]
pub struct UpdateStock {
    pub product_id: ProductId,
    pub new_value: Quantity,
    pub reason: String,
}

/// Administrative correction by a signed delta.
#[derive(Debug, Clone)]
pub struct AdjustStock {
    pub product_id: ProductId,
    pub delta: i64,
    pub reason: String,
}

/// Operation failure (misuse or infrastructure).
#[derive(Debug, Error)]
pub enum OperationError {
    /// Input rejected before the aggregate was touched.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Unknown product id. Not retried here.
    #[error("product not found")]
    NotFound,

    /// Mutation attempted on a deactivated product.
    #[error("product is inactive")]
    InactiveProduct,

    /// A stock-domain failure that is not an expected business outcome of
    /// the operation it escaped from.
    #[error("domain failure: {0}")]
    Domain(StockError),

    /// Persistence/publication failure, propagated unchanged.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Point-in-time stock figures attached to successful outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockSnapshot {
    pub current_stock: Quantity,
    pub reserved_stock: Quantity,
    pub available_stock: Quantity,
    pub status: StockStatus,
}

impl StockSnapshot {
    fn of(product: &Product) -> Self {
        Self {
            current_stock: product.current_stock(),
            reserved_stock: product.reserved_stock(),
            available_stock: product.available_stock(),
            status: product.stock_status(),
        }
    }
}

/// Proof of a successful reserve: the minted reservation plus the stock
/// figures the caller reports back to the saga.
#[derive(Debug, Clone)]
pub struct ReservationReceipt {
    pub reservation_id: ReservationId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub expires_at: DateTime<Utc>,
    pub stock: StockSnapshot,
}

#[derive(Debug, Clone)]
pub enum ReserveOutcome {
    Reserved(ReservationReceipt),
    /// Expected business outcome, not an error: there was not enough
    /// available stock. The OutOfStock event has already been flushed.
    Rejected {
        available_stock: Quantity,
        message: String,
    },
}

#[derive(Debug, Clone)]
pub enum ReleaseOutcome {
    Released { stock: StockSnapshot },
    Rejected {
        reserved_stock: Quantity,
        message: String,
    },
}

#[derive(Debug, Clone)]
pub enum ConfirmOutcome {
    Confirmed { stock: StockSnapshot },
    Rejected {
        reserved_stock: Quantity,
        message: String,
    },
}

/// Read-only projection of one product's stock and price.
#[derive(Debug, Clone)]
pub struct InventoryReport {
    pub product_id: ProductId,
    pub sku: Sku,
    pub name: String,
    pub unit_price: Money,
    pub stock: StockSnapshot,
}

/// Counts by derived stock status across a bulk check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockStatusTally {
    pub in_stock: usize,
    pub low_stock: usize,
    pub out_of_stock: usize,
    pub discontinued: usize,
}

impl StockStatusTally {
    fn count(&mut self, status: StockStatus) {
        match status {
            StockStatus::InStock => self.in_stock += 1,
            StockStatus::LowStock => self.low_stock += 1,
            StockStatus::OutOfStock => self.out_of_stock += 1,
            StockStatus::Discontinued => self.discontinued += 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BulkInventoryReport {
    pub reports: Vec<InventoryReport>,
    pub missing: Vec<ProductId>,
    pub summary: StockStatusTally,
}

/// The saga-facing operation set over one product repository and one
/// reservation store.
///
/// A product is loaded fresh per operation; no lock is held across
/// operations. Mutual exclusion between concurrent requests on the same
/// product is the repository's job (version check on save).
#[derive(Debug)]
pub struct InventoryOperations<P, S> {
    products: P,
    reservations: S,
    reservation_ttl: Duration,
}

impl<P, S> InventoryOperations<P, S>
where
    P: ProductRepository,
    S: ReservationStore,
{
    pub fn new(products: P, reservations: S) -> Self {
        Self {
            products,
            reservations,
            reservation_ttl: Duration::minutes(DEFAULT_RESERVATION_TTL_MINUTES),
        }
    }

    pub fn with_reservation_ttl(mut self, ttl: Duration) -> Self {
        self.reservation_ttl = ttl;
        self
    }

    /// Reserve stock for one order line item.
    ///
    /// On success a new Active reservation is persisted and its id returned.
    /// On insufficient stock the product is still saved so the buffered
    /// OutOfStock event reaches subscribers, and a `Rejected` outcome is
    /// returned.
    pub fn reserve_stock(
        &self,
        input: ReserveStock,
        now: DateTime<Utc>,
    ) -> Result<ReserveOutcome, OperationError> {
        ensure_positive(input.quantity)?;
        let mut product = self.load(input.product_id)?;

        match product.reserve(input.quantity, input.order_id, input.saga_id, now) {
            Ok(()) => {
                self.products.save(&mut product)?;

                let reservation = Reservation::new(
                    input.order_id,
                    vec![ReservationItem {
                        product_id: input.product_id,
                        quantity: input.quantity,
                    }],
                    now,
                    self.reservation_ttl,
                );
                self.reservations.insert(reservation.clone())?;

                info!(
                    product_id = %input.product_id,
                    order_id = %input.order_id,
                    quantity = %input.quantity,
                    reservation_id = %reservation.reservation_id(),
                    "stock reserved"
                );

                Ok(ReserveOutcome::Reserved(ReservationReceipt {
                    reservation_id: reservation.reservation_id(),
                    order_id: input.order_id,
                    product_id: input.product_id,
                    quantity: input.quantity,
                    expires_at: reservation.expires_at(),
                    stock: StockSnapshot::of(&product),
                }))
            }
            Err(StockError::ProductInactive) => Err(OperationError::InactiveProduct),
            Err(StockError::InsufficientStock {
                requested,
                available,
            }) => {
                // The rejection signal still has to reach alerting/restocking
                // subscribers; saving flushes the buffered OutOfStock event.
                self.products.save(&mut product)?;

                warn!(
                    product_id = %input.product_id,
                    order_id = %input.order_id,
                    requested,
                    available,
                    "reserve rejected: insufficient stock"
                );

                Ok(ReserveOutcome::Rejected {
                    available_stock: Quantity::new(available),
                    message: format!(
                        "insufficient stock for product {}: requested {requested}, available {available}",
                        input.product_id
                    ),
                })
            }
            Err(other) => Err(OperationError::Domain(other)),
        }
    }

    /// Release previously reserved stock (compensating action on cancel).
    ///
    /// The domain release is always attempted; an over-release comes back as
    /// a `Rejected` outcome, and success is reported only after persistence.
    pub fn release_stock(
        &self,
        input: ReleaseStock,
        now: DateTime<Utc>,
    ) -> Result<ReleaseOutcome, OperationError> {
        ensure_positive(input.quantity)?;
        let reason = non_empty_reason(&input.reason)?;
        let mut product = self.load(input.product_id)?;

        match product.release(input.quantity, input.order_id, reason, input.saga_id, now) {
            Ok(()) => {
                self.products.save(&mut product)?;
                self.settle_active_reservations(input.order_id, input.product_id, |r| {
                    r.release(reason, now)
                })?;

                info!(
                    product_id = %input.product_id,
                    order_id = %input.order_id,
                    quantity = %input.quantity,
                    reason,
                    "stock released"
                );

                Ok(ReleaseOutcome::Released {
                    stock: StockSnapshot::of(&product),
                })
            }
            Err(StockError::CannotRelease {
                requested,
                reserved,
            }) => {
                warn!(
                    product_id = %input.product_id,
                    order_id = %input.order_id,
                    requested,
                    reserved,
                    "release rejected: more than reserved"
                );

                Ok(ReleaseOutcome::Rejected {
                    reserved_stock: Quantity::new(reserved),
                    message: format!(
                        "cannot release {requested} units for product {}: only {reserved} reserved",
                        input.product_id
                    ),
                })
            }
            Err(other) => Err(OperationError::Domain(other)),
        }
    }

    /// Confirm reserved stock as sold (order completed).
    pub fn confirm_stock(
        &self,
        input: ConfirmStock,
        now: DateTime<Utc>,
    ) -> Result<ConfirmOutcome, OperationError> {
        ensure_positive(input.quantity)?;
        let mut product = self.load(input.product_id)?;

        if !product.is_active() {
            return Err(OperationError::InactiveProduct);
        }

        match product.confirm(input.quantity, input.order_id, input.saga_id, now) {
            Ok(()) => {
                self.products.save(&mut product)?;
                self.settle_active_reservations(input.order_id, input.product_id, |r| {
                    r.confirm(now)
                })?;

                info!(
                    product_id = %input.product_id,
                    order_id = %input.order_id,
                    quantity = %input.quantity,
                    "stock confirmed"
                );

                Ok(ConfirmOutcome::Confirmed {
                    stock: StockSnapshot::of(&product),
                })
            }
            Err(StockError::CannotConfirm {
                requested,
                reserved,
            }) => {
                warn!(
                    product_id = %input.product_id,
                    order_id = %input.order_id,
                    requested,
                    reserved,
                    "confirm rejected: more than reserved"
                );

                Ok(ConfirmOutcome::Rejected {
                    reserved_stock: Quantity::new(reserved),
                    message: format!(
                        "cannot confirm {requested} units for product {}: only {reserved} reserved",
                        input.product_id
                    ),
                })
            }
            Err(other) => Err(OperationError::Domain(other)),
        }
    }

    /// Restock from a supplier delivery.
    pub fn replenish_stock(
        &self,
        input: ReplenishStock,
        now: DateTime<Utc>,
    ) -> Result<StockSnapshot, OperationError> {
        ensure_positive(input.quantity)?;
        let reason = non_empty_reason(&input.reason)?;
        let mut product = self.load(input.product_id)?;

        product
            .replenish(input.quantity, reason, input.saga_id, now)
            .map_err(OperationError::Domain)?;
        self.products.save(&mut product)?;

        info!(
            product_id = %input.product_id,
            quantity = %input.quantity,
            reason,
            "stock replenished"
        );

        Ok(StockSnapshot::of(&product))
    }

    /// Administrative correction to an absolute value (e.g. recount).
    pub fn update_stock(
        &self,
        input: UpdateStock,
        now: DateTime<Utc>,
    ) -> Result<StockSnapshot, OperationError> {
        let reason = non_empty_reason(&input.reason)?;
        let mut product = self.load(input.product_id)?;

        let correction = product
            .update_stock(input.new_value, reason, now)
            .map_err(OperationError::Domain)?;
        self.products.save(&mut product)?;

        info!(
            product_id = %input.product_id,
            previous = %correction.previous,
            new = %correction.new,
            reason = %correction.reason,
            "stock corrected"
        );

        Ok(StockSnapshot::of(&product))
    }

    /// Administrative correction by a signed delta.
    pub fn adjust_stock(
        &self,
        input: AdjustStock,
        now: DateTime<Utc>,
    ) -> Result<StockSnapshot, OperationError> {
        let reason = non_empty_reason(&input.reason)?;
        let mut product = self.load(input.product_id)?;

        let correction = product
            .adjust_stock(input.delta, reason, now)
            .map_err(OperationError::Domain)?;
        self.products.save(&mut product)?;

        info!(
            product_id = %input.product_id,
            previous = %correction.previous,
            new = %correction.new,
            reason = %correction.reason,
            "stock corrected"
        );

        Ok(StockSnapshot::of(&product))
    }

    /// Read-only stock/price/status projection for one product.
    pub fn check_inventory(
        &self,
        product_id: ProductId,
    ) -> Result<InventoryReport, OperationError> {
        let product = self.load(product_id)?;
        Ok(report_of(&product))
    }

    /// Read-only projection over several products plus a status tally.
    /// Unknown ids are reported in `missing`, they do not fail the check.
    pub fn bulk_check_inventory(
        &self,
        product_ids: &[ProductId],
    ) -> Result<BulkInventoryReport, OperationError> {
        let products = self.products.find_by_ids(product_ids)?;

        let mut summary = StockStatusTally::default();
        let mut reports = Vec::with_capacity(products.len());
        for product in &products {
            summary.count(product.stock_status());
            reports.push(report_of(product));
        }

        let found: Vec<ProductId> = reports.iter().map(|r| r.product_id).collect();
        let missing = product_ids
            .iter()
            .filter(|id| !found.contains(id))
            .copied()
            .collect();

        Ok(BulkInventoryReport {
            reports,
            missing,
            summary,
        })
    }

    fn load(&self, product_id: ProductId) -> Result<Product, OperationError> {
        self.products
            .find_by_id(product_id)?
            .ok_or(OperationError::NotFound)
    }

    /// Apply a terminal transition to the order's active reservations that
    /// hold the given product, and persist them.
    fn settle_active_reservations(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        transition: impl Fn(&mut Reservation) -> Result<(), StockError>,
    ) -> Result<(), OperationError> {
        for mut reservation in self.reservations.find_active_by_order(order_id)? {
            let holds_product = reservation
                .items()
                .iter()
                .any(|item| item.product_id == product_id);
            if holds_product && transition(&mut reservation).is_ok() {
                self.reservations.update(&reservation)?;
            }
        }
        Ok(())
    }
}

fn ensure_positive(quantity: Quantity) -> Result<(), OperationError> {
    if quantity.is_zero() {
        return Err(OperationError::Validation(
            "quantity must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn non_empty_reason(reason: &str) -> Result<&str, OperationError> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(OperationError::Validation(
            "reason cannot be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

fn report_of(product: &Product) -> InventoryReport {
    InventoryReport {
        product_id: product.id_typed(),
        sku: product.sku().clone(),
        name: product.name().to_string(),
        unit_price: product.unit_price().clone(),
        stock: StockSnapshot::of(product),
    }
}
