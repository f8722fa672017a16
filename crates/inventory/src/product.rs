use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use artisania_core::{AggregateId, AggregateRoot, DomainError, DomainResult, OrderId, SagaId, ValueObject};
use artisania_events::Event;

use crate::error::{StockError, StockResult};
use crate::quantity::Quantity;

/// Aggregate type identifier used in event envelopes.
pub const PRODUCT_AGGREGATE_TYPE: &str = "inventory.product";

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub AggregateId);

impl ProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Identifier of the artisan who makes the product (owned by the parties
/// service; opaque here).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtisanId(pub AggregateId);

impl ArtisanId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ArtisanId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Identifier of the catalog category the product is listed under.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub AggregateId);

impl CategoryId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Unit price in minor currency units (e.g. cents) plus ISO currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: u64,
    currency: String,
}

impl Money {
    pub fn new(amount: u64, currency: impl Into<String>) -> DomainResult<Self> {
        let currency = currency.into();
        if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(DomainError::validation(format!(
                "currency must be a 3-letter ISO code, got '{currency}'"
            )));
        }
        Ok(Self { amount, currency })
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }
}

impl ValueObject for Money {}

/// Stock-keeping unit code: 3-32 chars of `A-Z`, `0-9` or `-`, with no
/// leading/trailing dash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    pub fn parse(raw: impl Into<String>) -> DomainResult<Self> {
        let raw = raw.into();
        let valid_len = (3..=32).contains(&raw.len());
        let valid_chars = raw
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'-');
        let valid_edges = !raw.starts_with('-') && !raw.ends_with('-');
        if !(valid_len && valid_chars && valid_edges) {
            return Err(DomainError::validation(format!(
                "malformed SKU '{raw}': expected 3-32 chars of A-Z, 0-9 or '-'"
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for Sku {}

impl core::fmt::Display for Sku {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derived stock status. Never stored: recomputed from current/reserved
/// stock, the activity flag and the reorder point after every mutation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
    Discontinued,
}

impl core::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            StockStatus::InStock => "in_stock",
            StockStatus::LowStock => "low_stock",
            StockStatus::OutOfStock => "out_of_stock",
            StockStatus::Discontinued => "discontinued",
        };
        f.write_str(s)
    }
}

/// Input to the `Product::create` factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub sku: Sku,
    pub name: String,
    pub unit_price: Money,
    pub artisan_id: ArtisanId,
    pub category_id: CategoryId,
    pub initial_stock: Quantity,
    pub minimum_stock: Quantity,
    pub maximum_stock: Quantity,
    /// Defaults to `minimum_stock` when absent.
    pub reorder_point: Option<Quantity>,
    /// Defaults to `maximum_stock - minimum_stock` when absent.
    pub reorder_quantity: Option<Quantity>,
}

/// Persisted shape of a product, used to rehydrate the aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub sku: Sku,
    pub name: String,
    pub unit_price: Money,
    pub artisan_id: ArtisanId,
    pub category_id: CategoryId,
    pub current_stock: Quantity,
    pub reserved_stock: Quantity,
    pub minimum_stock: Quantity,
    pub maximum_stock: Quantity,
    pub reorder_point: Quantity,
    pub reorder_quantity: Quantity,
    pub is_active: bool,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of an administrative stock correction, returned so the caller can
/// audit-log what changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockCorrection {
    pub previous: Quantity,
    pub new: Quantity,
    pub reason: String,
}

/// Aggregate root: the per-product stock ledger.
///
/// Holds physical stock, the reserved share of it, and the thresholds that
/// drive restocking signals. All mutation goes through the methods below;
/// each method validates fully before applying any field change, and buffers
/// the domain events describing the transition. The persistence layer drains
/// the buffer (`drain_events`) only after a successful commit, so events are
/// never observable before the state they describe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    sku: Sku,
    name: String,
    unit_price: Money,
    artisan_id: ArtisanId,
    category_id: CategoryId,
    current_stock: Quantity,
    reserved_stock: Quantity,
    minimum_stock: Quantity,
    maximum_stock: Quantity,
    reorder_point: Quantity,
    reorder_quantity: Quantity,
    is_active: bool,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    pending_events: Vec<StockEvent>,
}

impl Product {
    /// Create a new product with empty reservations.
    ///
    /// Assigns a fresh id, fills reorder defaults from the stock bounds and
    /// stamps both timestamps with `occurred_at`.
    pub fn create(new: NewProduct, occurred_at: DateTime<Utc>) -> DomainResult<Self> {
        if new.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if new.maximum_stock.less_than(new.minimum_stock) {
            return Err(DomainError::validation(
                "maximum stock cannot be below minimum stock",
            ));
        }

        let reorder_point = new.reorder_point.unwrap_or(new.minimum_stock);
        let reorder_quantity = new.reorder_quantity.unwrap_or_else(|| {
            new.maximum_stock
                .subtract(new.minimum_stock)
                .unwrap_or(Quantity::zero())
        });

        Ok(Self {
            id: ProductId::new(AggregateId::new()),
            sku: new.sku,
            name: new.name,
            unit_price: new.unit_price,
            artisan_id: new.artisan_id,
            category_id: new.category_id,
            current_stock: new.initial_stock,
            reserved_stock: Quantity::zero(),
            minimum_stock: new.minimum_stock,
            maximum_stock: new.maximum_stock,
            reorder_point,
            reorder_quantity,
            is_active: true,
            version: 1,
            created_at: occurred_at,
            updated_at: occurred_at,
            pending_events: Vec::new(),
        })
    }

    /// Rehydrate from a persisted snapshot.
    pub fn restore(snapshot: ProductSnapshot) -> Self {
        Self {
            id: snapshot.id,
            sku: snapshot.sku,
            name: snapshot.name,
            unit_price: snapshot.unit_price,
            artisan_id: snapshot.artisan_id,
            category_id: snapshot.category_id,
            current_stock: snapshot.current_stock,
            reserved_stock: snapshot.reserved_stock,
            minimum_stock: snapshot.minimum_stock,
            maximum_stock: snapshot.maximum_stock,
            reorder_point: snapshot.reorder_point,
            reorder_quantity: snapshot.reorder_quantity,
            is_active: snapshot.is_active,
            version: snapshot.version,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
            pending_events: Vec::new(),
        }
    }

    /// Persisted shape of the current state (pending events are not part of
    /// the snapshot; they travel through the publisher).
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            id: self.id,
            sku: self.sku.clone(),
            name: self.name.clone(),
            unit_price: self.unit_price.clone(),
            artisan_id: self.artisan_id,
            category_id: self.category_id,
            current_stock: self.current_stock,
            reserved_stock: self.reserved_stock,
            minimum_stock: self.minimum_stock,
            maximum_stock: self.maximum_stock,
            reorder_point: self.reorder_point,
            reorder_quantity: self.reorder_quantity,
            is_active: self.is_active,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit_price(&self) -> &Money {
        &self.unit_price
    }

    pub fn artisan_id(&self) -> ArtisanId {
        self.artisan_id
    }

    pub fn category_id(&self) -> CategoryId {
        self.category_id
    }

    pub fn current_stock(&self) -> Quantity {
        self.current_stock
    }

    pub fn reserved_stock(&self) -> Quantity {
        self.reserved_stock
    }

    /// `current_stock - reserved_stock`. Derived, never stored.
    pub fn available_stock(&self) -> Quantity {
        Quantity::new(self.current_stock.value().saturating_sub(self.reserved_stock.value()))
    }

    pub fn minimum_stock(&self) -> Quantity {
        self.minimum_stock
    }

    pub fn maximum_stock(&self) -> Quantity {
        self.maximum_stock
    }

    pub fn reorder_point(&self) -> Quantity {
        self.reorder_point
    }

    pub fn reorder_quantity(&self) -> Quantity {
        self.reorder_quantity
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn stock_status(&self) -> StockStatus {
        if !self.is_active {
            StockStatus::Discontinued
        } else if self.available_stock().is_zero() {
            StockStatus::OutOfStock
        } else if self.available_stock().less_than_or_equal(self.reorder_point) {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    /// Events buffered since the last drain, in emission order.
    pub fn pending_events(&self) -> &[StockEvent] {
        &self.pending_events
    }

    /// Take the buffered events. Invoked by the persistence layer only after
    /// a successful save.
    pub fn drain_events(&mut self) -> Vec<StockEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn can_reserve(&self, quantity: Quantity) -> bool {
        self.is_active && self.available_stock().greater_than_or_equal(quantity)
    }

    /// Place a hold of `quantity` units for an order.
    ///
    /// On insufficient stock the state stays untouched but an `OutOfStock`
    /// event is buffered before the error is returned: the event feeds
    /// alerting/restocking workflows while the error drives the caller's
    /// control flow.
    pub fn reserve(
        &mut self,
        quantity: Quantity,
        order_id: OrderId,
        saga_id: Option<SagaId>,
        occurred_at: DateTime<Utc>,
    ) -> StockResult<()> {
        if !self.is_active {
            return Err(StockError::ProductInactive);
        }
        if !self.can_reserve(quantity) {
            let available = self.available_stock();
            self.record(StockEvent::OutOfStock(OutOfStock {
                product_id: self.id,
                order_id,
                saga_id,
                requested_quantity: quantity,
                available_stock: available,
                occurred_at,
            }));
            return Err(StockError::InsufficientStock {
                requested: quantity.value(),
                available: available.value(),
            });
        }

        self.reserved_stock = self.reserved_stock.add(quantity)?;
        self.touch(occurred_at);
        self.record(StockEvent::Reserved(StockReserved {
            product_id: self.id,
            order_id,
            saga_id,
            quantity,
            current_stock: self.current_stock,
            reserved_stock: self.reserved_stock,
            available_stock: self.available_stock(),
            occurred_at,
        }));
        self.raise_low_stock_if_needed(occurred_at);
        Ok(())
    }

    /// Give back `quantity` previously reserved units (compensation path).
    pub fn release(
        &mut self,
        quantity: Quantity,
        order_id: OrderId,
        reason: impl Into<String>,
        saga_id: Option<SagaId>,
        occurred_at: DateTime<Utc>,
    ) -> StockResult<()> {
        if self.reserved_stock.less_than(quantity) {
            return Err(StockError::CannotRelease {
                requested: quantity.value(),
                reserved: self.reserved_stock.value(),
            });
        }

        self.reserved_stock = self.reserved_stock.subtract(quantity)?;
        self.touch(occurred_at);
        self.record(StockEvent::Released(StockReleased {
            product_id: self.id,
            order_id,
            saga_id,
            quantity,
            reason: reason.into(),
            current_stock: self.current_stock,
            reserved_stock: self.reserved_stock,
            available_stock: self.available_stock(),
            occurred_at,
        }));
        Ok(())
    }

    /// Convert a hold into a permanent deduction (order completed).
    pub fn confirm(
        &mut self,
        quantity: Quantity,
        order_id: OrderId,
        saga_id: Option<SagaId>,
        occurred_at: DateTime<Utc>,
    ) -> StockResult<()> {
        if self.reserved_stock.less_than(quantity) {
            return Err(StockError::CannotConfirm {
                requested: quantity.value(),
                reserved: self.reserved_stock.value(),
            });
        }

        let new_current = self.current_stock.subtract(quantity)?;
        let new_reserved = self.reserved_stock.subtract(quantity)?;
        self.current_stock = new_current;
        self.reserved_stock = new_reserved;
        self.touch(occurred_at);
        self.record(StockEvent::Deducted(StockDeducted {
            product_id: self.id,
            order_id,
            saga_id,
            quantity,
            current_stock: self.current_stock,
            reserved_stock: self.reserved_stock,
            available_stock: self.available_stock(),
            occurred_at,
        }));
        self.raise_low_stock_if_needed(occurred_at);
        Ok(())
    }

    /// Restock from a supplier delivery.
    pub fn replenish(
        &mut self,
        quantity: Quantity,
        reason: impl Into<String>,
        saga_id: Option<SagaId>,
        occurred_at: DateTime<Utc>,
    ) -> StockResult<()> {
        let previous = self.current_stock;
        self.current_stock = self.current_stock.add(quantity)?;
        self.touch(occurred_at);
        self.record(StockEvent::Replenished(StockReplenished {
            product_id: self.id,
            saga_id,
            quantity,
            reason: reason.into(),
            previous_stock: previous,
            new_stock: self.current_stock,
            occurred_at,
        }));
        Ok(())
    }

    /// Administrative correction to an absolute value (e.g. after a recount).
    ///
    /// Emits no granular event; the returned correction carries what changed
    /// for the caller's audit log.
    pub fn update_stock(
        &mut self,
        new_value: Quantity,
        reason: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> StockResult<StockCorrection> {
        if new_value.less_than(self.reserved_stock) {
            return Err(StockError::CorrectionBelowReserved {
                requested: new_value.value(),
                reserved: self.reserved_stock.value(),
            });
        }

        let previous = self.current_stock;
        self.current_stock = new_value;
        self.version += 1;
        self.touch(occurred_at);
        Ok(StockCorrection {
            previous,
            new: new_value,
            reason: reason.into(),
        })
    }

    /// Administrative correction by a signed delta.
    pub fn adjust_stock(
        &mut self,
        delta: i64,
        reason: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> StockResult<StockCorrection> {
        let new_value = if delta >= 0 {
            self.current_stock.add(Quantity::new(delta as u64))?
        } else {
            self.current_stock.subtract(Quantity::new(delta.unsigned_abs()))?
        };
        self.update_stock(new_value, reason, occurred_at)
    }

    /// No-op when already active: administrative toggles may be retried.
    pub fn activate(&mut self, occurred_at: DateTime<Utc>) {
        if self.is_active {
            return;
        }
        self.is_active = true;
        self.version += 1;
        self.touch(occurred_at);
    }

    /// Logical retirement; the product is never physically deleted here.
    pub fn deactivate(&mut self, occurred_at: DateTime<Utc>) {
        if !self.is_active {
            return;
        }
        self.is_active = false;
        self.version += 1;
        self.touch(occurred_at);
    }

    fn raise_low_stock_if_needed(&mut self, occurred_at: DateTime<Utc>) {
        if self.available_stock().less_than_or_equal(self.reorder_point) {
            self.record(StockEvent::LowStock(LowStock {
                product_id: self.id,
                available_stock: self.available_stock(),
                reorder_point: self.reorder_point,
                reorder_quantity: self.reorder_quantity,
                occurred_at,
            }));
        }
    }

    fn record(&mut self, event: StockEvent) {
        self.pending_events.push(event);
        self.version += 1;
    }

    fn touch(&mut self, occurred_at: DateTime<Utc>) {
        self.updated_at = occurred_at;
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Event: stock was reserved for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReserved {
    pub product_id: ProductId,
    pub order_id: OrderId,
    pub saga_id: Option<SagaId>,
    pub quantity: Quantity,
    pub current_stock: Quantity,
    pub reserved_stock: Quantity,
    pub available_stock: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Event: a reserve attempt was rejected for lack of stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutOfStock {
    pub product_id: ProductId,
    pub order_id: OrderId,
    pub saga_id: Option<SagaId>,
    pub requested_quantity: Quantity,
    pub available_stock: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Event: reserved stock was given back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReleased {
    pub product_id: ProductId,
    pub order_id: OrderId,
    pub saga_id: Option<SagaId>,
    pub quantity: Quantity,
    pub reason: String,
    pub current_stock: Quantity,
    pub reserved_stock: Quantity,
    pub available_stock: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Event: a reservation was converted into a permanent deduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDeducted {
    pub product_id: ProductId,
    pub order_id: OrderId,
    pub saga_id: Option<SagaId>,
    pub quantity: Quantity,
    pub current_stock: Quantity,
    pub reserved_stock: Quantity,
    pub available_stock: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Event: physical stock was replenished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReplenished {
    pub product_id: ProductId,
    pub saga_id: Option<SagaId>,
    pub quantity: Quantity,
    pub reason: String,
    pub previous_stock: Quantity,
    pub new_stock: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Event: available stock fell to or below the reorder point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStock {
    pub product_id: ProductId,
    pub available_stock: Quantity,
    pub reorder_point: Quantity,
    pub reorder_quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockEvent {
    Reserved(StockReserved),
    OutOfStock(OutOfStock),
    Released(StockReleased),
    Deducted(StockDeducted),
    Replenished(StockReplenished),
    LowStock(LowStock),
}

impl Event for StockEvent {
    fn event_type(&self) -> &'static str {
        match self {
            StockEvent::Reserved(_) => "inventory.stock.reserved",
            StockEvent::OutOfStock(_) => "inventory.stock.out_of_stock",
            StockEvent::Released(_) => "inventory.stock.released",
            StockEvent::Deducted(_) => "inventory.stock.deducted",
            StockEvent::Replenished(_) => "inventory.stock.replenished",
            StockEvent::LowStock(_) => "inventory.stock.low",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            StockEvent::Reserved(e) => e.occurred_at,
            StockEvent::OutOfStock(e) => e.occurred_at,
            StockEvent::Released(e) => e.occurred_at,
            StockEvent::Deducted(e) => e.occurred_at,
            StockEvent::Replenished(e) => e.occurred_at,
            StockEvent::LowStock(e) => e.occurred_at,
        }
    }

    fn saga_id(&self) -> Option<SagaId> {
        match self {
            StockEvent::Reserved(e) => e.saga_id,
            StockEvent::OutOfStock(e) => e.saga_id,
            StockEvent::Released(e) => e.saga_id,
            StockEvent::Deducted(e) => e.saga_id,
            StockEvent::Replenished(e) => e.saga_id,
            StockEvent::LowStock(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eur(amount: u64) -> Money {
        Money::new(amount, "EUR").unwrap()
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn new_product(initial_stock: u64) -> NewProduct {
        NewProduct {
            sku: Sku::parse("OLIVE-OIL-500").unwrap(),
            name: "Olive oil 500ml".to_string(),
            unit_price: eur(1299),
            artisan_id: ArtisanId::new(AggregateId::new()),
            category_id: CategoryId::new(AggregateId::new()),
            initial_stock: Quantity::new(initial_stock),
            minimum_stock: Quantity::new(5),
            maximum_stock: Quantity::new(500),
            reorder_point: None,
            reorder_quantity: None,
        }
    }

    fn product_with(current: u64, reserved: u64, reorder_point: u64) -> Product {
        Product::restore(ProductSnapshot {
            id: ProductId::new(AggregateId::new()),
            sku: Sku::parse("CERAMIC-BOWL-M").unwrap(),
            name: "Ceramic bowl, medium".to_string(),
            unit_price: eur(2450),
            artisan_id: ArtisanId::new(AggregateId::new()),
            category_id: CategoryId::new(AggregateId::new()),
            current_stock: Quantity::new(current),
            reserved_stock: Quantity::new(reserved),
            minimum_stock: Quantity::new(5),
            maximum_stock: Quantity::new(500),
            reorder_point: Quantity::new(reorder_point),
            reorder_quantity: Quantity::new(50),
            is_active: true,
            version: 1,
            created_at: test_time(),
            updated_at: test_time(),
        })
    }

    #[test]
    fn create_fills_reorder_defaults() {
        let product = Product::create(new_product(100), test_time()).unwrap();

        assert_eq!(product.reorder_point(), Quantity::new(5));
        assert_eq!(product.reorder_quantity(), Quantity::new(495));
        assert_eq!(product.current_stock(), Quantity::new(100));
        assert_eq!(product.reserved_stock(), Quantity::zero());
        assert!(product.is_active());
        assert_eq!(product.version(), 1);
        assert!(product.pending_events().is_empty());
    }

    #[test]
    fn create_rejects_empty_name() {
        let mut new = new_product(10);
        new.name = "   ".to_string();

        let err = Product::create(new, test_time()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn create_rejects_maximum_below_minimum() {
        let mut new = new_product(10);
        new.maximum_stock = Quantity::new(2);

        let err = Product::create(new, test_time()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn sku_parsing() {
        assert!(Sku::parse("OLIVE-OIL-500").is_ok());
        assert!(Sku::parse("A1").is_err());
        assert!(Sku::parse("lowercase-sku").is_err());
        assert!(Sku::parse("-LEADING").is_err());
        assert!(Sku::parse("TRAILING-").is_err());
    }

    #[test]
    fn money_rejects_malformed_currency() {
        assert!(Money::new(100, "EUR").is_ok());
        assert!(Money::new(100, "eur").is_err());
        assert!(Money::new(100, "EURO").is_err());
    }

    #[test]
    fn reserve_increments_reserved_stock() {
        // Scenario: 100 on hand, 10 already held, reorder point 20.
        let mut product = product_with(100, 10, 20);

        product
            .reserve(Quantity::new(20), OrderId::new(), None, test_time())
            .unwrap();

        assert_eq!(product.reserved_stock(), Quantity::new(30));
        assert_eq!(product.available_stock(), Quantity::new(70));

        // 70 available is well above the reorder point: no low-stock signal.
        let events = product.pending_events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            StockEvent::Reserved(e) => {
                assert_eq!(e.quantity, Quantity::new(20));
                assert_eq!(e.current_stock, Quantity::new(100));
                assert_eq!(e.reserved_stock, Quantity::new(30));
                assert_eq!(e.available_stock, Quantity::new(70));
            }
            other => panic!("expected Reserved event, got {other:?}"),
        }
    }

    #[test]
    fn reserve_emits_low_stock_when_crossing_reorder_point() {
        let mut product = product_with(30, 10, 20);

        product
            .reserve(Quantity::new(5), OrderId::new(), None, test_time())
            .unwrap();

        assert_eq!(product.available_stock(), Quantity::new(15));

        let events = product.pending_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], StockEvent::Reserved(_)));
        match &events[1] {
            StockEvent::LowStock(e) => {
                assert_eq!(e.available_stock, Quantity::new(15));
                assert_eq!(e.reorder_point, Quantity::new(20));
            }
            other => panic!("expected LowStock event, got {other:?}"),
        }
    }

    #[test]
    fn reserve_rejects_insufficient_stock_and_buffers_out_of_stock() {
        let mut product = product_with(50, 40, 5);
        let order_id = OrderId::new();

        let err = product
            .reserve(Quantity::new(20), order_id, None, test_time())
            .unwrap_err();
        assert_eq!(
            err,
            StockError::InsufficientStock {
                requested: 20,
                available: 10
            }
        );

        // State untouched, but the signal for restocking workflows is buffered.
        assert_eq!(product.current_stock(), Quantity::new(50));
        assert_eq!(product.reserved_stock(), Quantity::new(40));

        let events = product.pending_events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            StockEvent::OutOfStock(e) => {
                assert_eq!(e.requested_quantity, Quantity::new(20));
                assert_eq!(e.available_stock, Quantity::new(10));
                assert_eq!(e.order_id, order_id);
            }
            other => panic!("expected OutOfStock event, got {other:?}"),
        }
    }

    #[test]
    fn reserve_rejects_inactive_product_without_event() {
        let mut product = product_with(100, 0, 5);
        product.deactivate(test_time());

        let err = product
            .reserve(Quantity::new(1), OrderId::new(), None, test_time())
            .unwrap_err();
        assert_eq!(err, StockError::ProductInactive);
        assert!(product.pending_events().is_empty());
    }

    #[test]
    fn can_reserve_respects_activity_and_availability() {
        let mut product = product_with(10, 4, 2);
        assert!(product.can_reserve(Quantity::new(6)));
        assert!(!product.can_reserve(Quantity::new(7)));

        product.deactivate(test_time());
        assert!(!product.can_reserve(Quantity::new(1)));
    }

    #[test]
    fn release_returns_reserved_stock_and_carries_reason() {
        let mut product = product_with(100, 30, 5);
        let order_id = OrderId::new();

        product
            .release(Quantity::new(20), order_id, "order_cancelled", None, test_time())
            .unwrap();

        assert_eq!(product.reserved_stock(), Quantity::new(10));
        assert_eq!(product.current_stock(), Quantity::new(100));

        match &product.pending_events()[0] {
            StockEvent::Released(e) => {
                assert_eq!(e.reason, "order_cancelled");
                assert_eq!(e.order_id, order_id);
                assert_eq!(e.reserved_stock, Quantity::new(10));
            }
            other => panic!("expected Released event, got {other:?}"),
        }
    }

    #[test]
    fn release_rejects_more_than_reserved() {
        let mut product = product_with(100, 10, 5);

        let err = product
            .release(Quantity::new(11), OrderId::new(), "oops", None, test_time())
            .unwrap_err();
        assert_eq!(
            err,
            StockError::CannotRelease {
                requested: 11,
                reserved: 10
            }
        );
        assert_eq!(product.reserved_stock(), Quantity::new(10));
        assert!(product.pending_events().is_empty());
    }

    #[test]
    fn confirm_deducts_current_and_reserved() {
        let mut product = product_with(100, 30, 5);

        product
            .confirm(Quantity::new(20), OrderId::new(), None, test_time())
            .unwrap();

        assert_eq!(product.current_stock(), Quantity::new(80));
        assert_eq!(product.reserved_stock(), Quantity::new(10));

        let events = product.pending_events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            StockEvent::Deducted(e) => {
                assert_eq!(e.quantity, Quantity::new(20));
                assert_eq!(e.current_stock, Quantity::new(80));
                assert_eq!(e.reserved_stock, Quantity::new(10));
            }
            other => panic!("expected Deducted event, got {other:?}"),
        }
    }

    #[test]
    fn confirm_rejects_more_than_reserved_without_mutation() {
        let mut product = product_with(100, 10, 5);

        let err = product
            .confirm(Quantity::new(20), OrderId::new(), None, test_time())
            .unwrap_err();
        assert_eq!(
            err,
            StockError::CannotConfirm {
                requested: 20,
                reserved: 10
            }
        );
        assert_eq!(product.current_stock(), Quantity::new(100));
        assert_eq!(product.reserved_stock(), Quantity::new(10));
        assert!(product.pending_events().is_empty());
    }

    #[test]
    fn confirm_twice_succeeds_once() {
        let mut product = product_with(50, 20, 2);
        let order_id = OrderId::new();

        product
            .confirm(Quantity::new(20), order_id, None, test_time())
            .unwrap();
        let after_first = (product.current_stock(), product.reserved_stock());

        let err = product
            .confirm(Quantity::new(20), order_id, None, test_time())
            .unwrap_err();
        assert!(matches!(err, StockError::CannotConfirm { .. }));
        assert_eq!((product.current_stock(), product.reserved_stock()), after_first);
    }

    #[test]
    fn confirm_reevaluates_low_stock() {
        let mut product = product_with(30, 10, 20);

        product
            .confirm(Quantity::new(10), OrderId::new(), None, test_time())
            .unwrap();

        // 20 available after the deduction, right at the reorder point.
        let events = product.pending_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], StockEvent::Deducted(_)));
        assert!(matches!(events[1], StockEvent::LowStock(_)));
    }

    #[test]
    fn replenish_records_before_and_after() {
        let mut product = product_with(40, 10, 5);

        product
            .replenish(Quantity::new(60), "supplier_delivery", None, test_time())
            .unwrap();

        assert_eq!(product.current_stock(), Quantity::new(100));
        match &product.pending_events()[0] {
            StockEvent::Replenished(e) => {
                assert_eq!(e.previous_stock, Quantity::new(40));
                assert_eq!(e.new_stock, Quantity::new(100));
                assert_eq!(e.reason, "supplier_delivery");
            }
            other => panic!("expected Replenished event, got {other:?}"),
        }
    }

    #[test]
    fn update_stock_rejects_falling_below_reserved() {
        let mut product = product_with(100, 30, 5);

        let err = product
            .update_stock(Quantity::new(20), "recount", test_time())
            .unwrap_err();
        assert_eq!(
            err,
            StockError::CorrectionBelowReserved {
                requested: 20,
                reserved: 30
            }
        );
        assert_eq!(product.current_stock(), Quantity::new(100));
    }

    #[test]
    fn adjust_stock_applies_signed_delta() {
        let mut product = product_with(100, 10, 5);

        let correction = product.adjust_stock(-15, "breakage", test_time()).unwrap();
        assert_eq!(correction.previous, Quantity::new(100));
        assert_eq!(correction.new, Quantity::new(85));
        assert_eq!(product.current_stock(), Quantity::new(85));

        product.adjust_stock(5, "found_in_back_room", test_time()).unwrap();
        assert_eq!(product.current_stock(), Quantity::new(90));

        // Corrections are administrative and deliberately emit nothing.
        assert!(product.pending_events().is_empty());
    }

    #[test]
    fn adjust_stock_rejects_negative_result() {
        let mut product = product_with(10, 0, 5);

        let err = product.adjust_stock(-11, "recount", test_time()).unwrap_err();
        assert_eq!(err, StockError::NegativeQuantity);
        assert_eq!(product.current_stock(), Quantity::new(10));
    }

    #[test]
    fn activation_toggles_are_idempotent() {
        let mut product = product_with(10, 0, 5);
        let version = product.version();

        product.activate(test_time());
        assert_eq!(product.version(), version);

        product.deactivate(test_time());
        assert!(!product.is_active());
        assert_eq!(product.version(), version + 1);

        product.deactivate(test_time());
        assert_eq!(product.version(), version + 1);
    }

    #[test]
    fn stock_status_is_derived() {
        let mut product = product_with(100, 0, 20);
        assert_eq!(product.stock_status(), StockStatus::InStock);

        product
            .reserve(Quantity::new(85), OrderId::new(), None, test_time())
            .unwrap();
        assert_eq!(product.stock_status(), StockStatus::LowStock);

        product
            .reserve(Quantity::new(15), OrderId::new(), None, test_time())
            .unwrap();
        assert_eq!(product.stock_status(), StockStatus::OutOfStock);

        product.deactivate(test_time());
        assert_eq!(product.stock_status(), StockStatus::Discontinued);
    }

    #[test]
    fn reserve_then_release_conserves_reserved_stock() {
        let mut product = product_with(100, 10, 5);
        let order_id = OrderId::new();

        product
            .reserve(Quantity::new(25), order_id, None, test_time())
            .unwrap();
        product
            .release(Quantity::new(25), order_id, "order_cancelled", None, test_time())
            .unwrap();

        assert_eq!(product.reserved_stock(), Quantity::new(10));

        let events = product.pending_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], StockEvent::Reserved(_)));
        assert!(matches!(events[1], StockEvent::Released(_)));
    }

    #[test]
    fn drain_events_empties_the_buffer() {
        let mut product = product_with(100, 0, 5);
        product
            .reserve(Quantity::new(10), OrderId::new(), None, test_time())
            .unwrap();

        let drained = product.drain_events();
        assert_eq!(drained.len(), 1);
        assert!(product.pending_events().is_empty());
        assert!(product.drain_events().is_empty());
    }

    #[test]
    fn version_bumps_once_per_recorded_event() {
        let mut product = product_with(100, 0, 50);
        let version = product.version();

        // Reserve that also crosses the reorder point: two events, two bumps.
        product
            .reserve(Quantity::new(60), OrderId::new(), None, test_time())
            .unwrap();
        assert_eq!(product.version(), version + 2);
    }

    #[test]
    fn snapshot_roundtrip_preserves_state() {
        let mut product = product_with(100, 10, 20);
        product
            .reserve(Quantity::new(5), OrderId::new(), None, test_time())
            .unwrap();
        product.drain_events();

        let restored = Product::restore(product.snapshot());
        assert_eq!(restored, product);
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Reserve(u64),
            Release(u64),
            Confirm(u64),
            Replenish(u64),
            Adjust(i64),
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                (1u64..=40).prop_map(Op::Reserve),
                (1u64..=40).prop_map(Op::Release),
                (1u64..=40).prop_map(Op::Confirm),
                (1u64..=40).prop_map(Op::Replenish),
                (-40i64..=40).prop_map(Op::Adjust),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: reserved never exceeds current, whatever sequence of
            /// operations is attempted (failed operations change nothing).
            #[test]
            fn invariant_holds_under_arbitrary_operations(ops in proptest::collection::vec(op_strategy(), 1..60)) {
                let mut product = product_with(100, 0, 10);
                let order_id = OrderId::new();
                let now = test_time();

                for op in ops {
                    let _ = match op {
                        Op::Reserve(q) => product.reserve(Quantity::new(q), order_id, None, now),
                        Op::Release(q) => product.release(Quantity::new(q), order_id, "test", None, now),
                        Op::Confirm(q) => product.confirm(Quantity::new(q), order_id, None, now),
                        Op::Replenish(q) => product.replenish(Quantity::new(q), "restock", None, now),
                        Op::Adjust(d) => product.adjust_stock(d, "recount", now).map(|_| ()),
                    };

                    prop_assert!(product.reserved_stock().less_than_or_equal(product.current_stock()));
                    prop_assert!(
                        product.available_stock().value()
                            == product.current_stock().value() - product.reserved_stock().value()
                    );
                }
            }

            /// Property: a successful reserve followed by an equal release
            /// restores the prior reserved stock.
            #[test]
            fn reserve_release_conservation(
                (current, reserved) in (1u64..=500).prop_flat_map(|c| (Just(c), 0u64..=c)),
                quantity in 1u64..=550,
            ) {
                let mut product = product_with(current, reserved, 10);
                let order_id = OrderId::new();
                let now = test_time();

                if product.reserve(Quantity::new(quantity), order_id, None, now).is_ok() {
                    product.release(Quantity::new(quantity), order_id, "test", None, now).unwrap();
                    prop_assert_eq!(product.reserved_stock(), Quantity::new(reserved));
                    prop_assert_eq!(product.current_stock(), Quantity::new(current));
                }
            }

            /// Property: reserve then confirm reduces both sides by the same
            /// quantity.
            #[test]
            fn reserve_confirm_conservation(
                (current, reserved) in (1u64..=500).prop_flat_map(|c| (Just(c), 0u64..=c)),
                quantity in 1u64..=550,
            ) {
                let mut product = product_with(current, reserved, 10);
                let order_id = OrderId::new();
                let now = test_time();

                if product.reserve(Quantity::new(quantity), order_id, None, now).is_ok() {
                    product.confirm(Quantity::new(quantity), order_id, None, now).unwrap();
                    prop_assert_eq!(product.current_stock(), Quantity::new(current - quantity));
                    prop_assert_eq!(product.reserved_stock(), Quantity::new(reserved));
                }
            }
        }
    }
}
