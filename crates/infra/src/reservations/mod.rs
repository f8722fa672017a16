//! Persistence contract for reservation records.
//!
//! Reservations are audit records: they are inserted on reserve, updated on
//! terminal transitions, and never deleted. `find_expired` is the query the
//! expiry sweeper polls on.

mod in_memory;

pub use in_memory::InMemoryReservationStore;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use artisania_core::OrderId;
use artisania_inventory::{Reservation, ReservationId};

use crate::repository::RepositoryError;

pub trait ReservationStore: Send + Sync {
    fn insert(&self, reservation: Reservation) -> Result<(), RepositoryError>;

    fn update(&self, reservation: &Reservation) -> Result<(), RepositoryError>;

    fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>, RepositoryError>;

    fn find_active_by_order(&self, order_id: OrderId) -> Result<Vec<Reservation>, RepositoryError>;

    /// Active reservations whose deadline has passed.
    fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<Reservation>, RepositoryError>;
}

impl<S> ReservationStore for Arc<S>
where
    S: ReservationStore + ?Sized,
{
    fn insert(&self, reservation: Reservation) -> Result<(), RepositoryError> {
        (**self).insert(reservation)
    }

    fn update(&self, reservation: &Reservation) -> Result<(), RepositoryError> {
        (**self).update(reservation)
    }

    fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>, RepositoryError> {
        (**self).find_by_id(id)
    }

    fn find_active_by_order(&self, order_id: OrderId) -> Result<Vec<Reservation>, RepositoryError> {
        (**self).find_active_by_order(order_id)
    }

    fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<Reservation>, RepositoryError> {
        (**self).find_expired(now)
    }
}
