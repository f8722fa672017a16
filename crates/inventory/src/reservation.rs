use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use artisania_core::{AggregateId, Entity, OrderId};

use crate::error::{StockError, StockResult};
use crate::product::ProductId;
use crate::quantity::Quantity;

/// Default time-to-live of a stock reservation.
pub const DEFAULT_RESERVATION_TTL_MINUTES: i64 = 15;

/// Release reason recorded when a reservation times out.
pub const RESERVATION_EXPIRED_REASON: &str = "order_expired";

/// Reservation identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(pub AggregateId);

impl ReservationId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ReservationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// One product/quantity pair held by a reservation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationItem {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

/// Reservation lifecycle status.
///
/// `Released`, `Expired` and `Confirmed` are terminal: transitions only ever
/// originate from `Active`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Active,
    Released,
    Expired,
    Confirmed,
}

impl core::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            ReservationStatus::Active => "active",
            ReservationStatus::Released => "released",
            ReservationStatus::Expired => "expired",
            ReservationStatus::Confirmed => "confirmed",
        };
        f.write_str(s)
    }
}

/// A time-bound hold on stock pending order completion or cancellation.
///
/// Created by the reserve operation when the requested units are available;
/// retained indefinitely as an audit record once it reaches a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    reservation_id: ReservationId,
    order_id: OrderId,
    items: Vec<ReservationItem>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    status: ReservationStatus,
    released_at: Option<DateTime<Utc>>,
    release_reason: Option<String>,
}

impl Reservation {
    pub fn new(
        order_id: OrderId,
        items: Vec<ReservationItem>,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            reservation_id: ReservationId::new(AggregateId::new()),
            order_id,
            items,
            created_at,
            expires_at: created_at + ttl,
            status: ReservationStatus::Active,
            released_at: None,
            release_reason: None,
        }
    }

    pub fn with_default_ttl(
        order_id: OrderId,
        items: Vec<ReservationItem>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            order_id,
            items,
            created_at,
            Duration::minutes(DEFAULT_RESERVATION_TTL_MINUTES),
        )
    }

    pub fn reservation_id(&self) -> ReservationId {
        self.reservation_id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn items(&self) -> &[ReservationItem] {
        &self.items
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    pub fn released_at(&self) -> Option<DateTime<Utc>> {
        self.released_at
    }

    pub fn release_reason(&self) -> Option<&str> {
        self.release_reason.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Active
    }

    /// Whether the hold has outlived its deadline without reaching a terminal
    /// state. Expiry itself is driven by an external sweeper.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at && self.status == ReservationStatus::Active
    }

    /// Sum of all item quantities, used for reporting.
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| item.quantity.value()).sum()
    }

    /// Active → Released (order cancelled or compensated).
    pub fn release(&mut self, reason: impl Into<String>, now: DateTime<Utc>) -> StockResult<()> {
        self.ensure_active()?;
        self.status = ReservationStatus::Released;
        self.released_at = Some(now);
        self.release_reason = Some(reason.into());
        Ok(())
    }

    /// Active → Confirmed (order completed; the hold became a deduction).
    pub fn confirm(&mut self, now: DateTime<Utc>) -> StockResult<()> {
        self.ensure_active()?;
        self.status = ReservationStatus::Confirmed;
        self.released_at = Some(now);
        Ok(())
    }

    /// Active → Expired.
    ///
    /// Silently returns on any non-active status: the external timer driving
    /// expiry may fire more than once for the same reservation.
    pub fn expire(&mut self, now: DateTime<Utc>) {
        if self.status != ReservationStatus::Active {
            return;
        }
        self.status = ReservationStatus::Expired;
        self.released_at = Some(now);
        self.release_reason = Some(RESERVATION_EXPIRED_REASON.to_string());
    }

    fn ensure_active(&self) -> StockResult<()> {
        if self.status != ReservationStatus::Active {
            return Err(StockError::InvalidReservationState {
                actual: self.status,
            });
        }
        Ok(())
    }
}

impl Entity for Reservation {
    type Id = ReservationId;

    fn id(&self) -> &Self::Id {
        &self.reservation_id
    }
}
