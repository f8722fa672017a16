use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use artisania_core::OrderId;
use artisania_inventory::{Reservation, ReservationId};

use super::ReservationStore;
use crate::repository::RepositoryError;

/// In-memory reservation store keyed by id. Test fixture.
#[derive(Debug, Default)]
pub struct InMemoryReservationStore {
    records: RwLock<HashMap<ReservationId, Reservation>>,
}

impl InMemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReservationStore for InMemoryReservationStore {
    fn insert(&self, reservation: Reservation) -> Result<(), RepositoryError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;

        records.insert(reservation.reservation_id(), reservation);
        Ok(())
    }

    fn update(&self, reservation: &Reservation) -> Result<(), RepositoryError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;

        if !records.contains_key(&reservation.reservation_id()) {
            return Err(RepositoryError::Storage(format!(
                "unknown reservation {}",
                reservation.reservation_id()
            )));
        }

        records.insert(reservation.reservation_id(), reservation.clone());
        Ok(())
    }

    fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>, RepositoryError> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;

        Ok(records.get(&id).cloned())
    }

    fn find_active_by_order(&self, order_id: OrderId) -> Result<Vec<Reservation>, RepositoryError> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;

        Ok(records
            .values()
            .filter(|r| r.order_id() == order_id && r.is_active())
            .cloned()
            .collect())
    }

    fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<Reservation>, RepositoryError> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;

        Ok(records
            .values()
            .filter(|r| r.is_expired(now))
            .cloned()
            .collect())
    }
}
