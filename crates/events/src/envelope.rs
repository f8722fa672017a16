use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use artisania_core::{AggregateId, SagaId};

use crate::event::Event;

/// Envelope for an event, containing the metadata downstream consumers route
/// and deduplicate on.
///
/// This is the unit handed to the publisher after a successful persist.
///
/// Notes:
/// - Routing is by `event_type`; delivery is at-least-once, so consumers
///   must deduplicate by `event_id`.
/// - `sequence_number` is monotonically increasing per aggregate, assigned
///   at flush time; events from one mutation keep their emission order.
/// - `saga_id` correlates the event to the workflow step that drove it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,

    aggregate_id: AggregateId,
    aggregate_type: String,

    event_type: String,
    event_version: u32,
    occurred_at: DateTime<Utc>,

    /// Monotonically increasing position in the aggregate's event sequence.
    sequence_number: u64,

    saga_id: Option<SagaId>,

    payload: E,
}

impl<E> EventEnvelope<E> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        event_id: Uuid,
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        event_type: impl Into<String>,
        event_version: u32,
        occurred_at: DateTime<Utc>,
        sequence_number: u64,
        saga_id: Option<SagaId>,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            event_type: event_type.into(),
            event_version,
            occurred_at,
            sequence_number,
            saga_id,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn aggregate_id(&self) -> AggregateId {
        self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn event_version(&self) -> u32 {
        self.event_version
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn saga_id(&self) -> Option<SagaId> {
        self.saga_id
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

impl<E: Event> EventEnvelope<E> {
    /// Wrap a typed event, lifting its metadata into the envelope.
    pub fn from_event(
        event_id: Uuid,
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        sequence_number: u64,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            event_type: payload.event_type().to_string(),
            event_version: payload.version(),
            occurred_at: payload.occurred_at(),
            sequence_number,
            saga_id: payload.saga_id(),
            payload,
        }
    }
}
