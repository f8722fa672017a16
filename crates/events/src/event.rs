use chrono::{DateTime, Utc};

use artisania_core::SagaId;

/// A domain-agnostic event.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - **versioned** (schema evolution)
/// - designed to be **append-only**
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "inventory.stock.reserved").
    ///
    /// Doubles as the routing topic: subscribers bind by event type.
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Workflow correlation id, when the mutation was driven by a saga step.
    fn saga_id(&self) -> Option<SagaId> {
        None
    }
}
