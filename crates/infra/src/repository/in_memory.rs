use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use artisania_events::{EventBus, EventEnvelope};
use artisania_inventory::{
    ArtisanId, CategoryId, Product, ProductId, ProductSnapshot, StockEvent, StockStatus,
    PRODUCT_AGGREGATE_TYPE,
};

use super::{ProductRepository, RepositoryError};

#[derive(Debug, Clone)]
struct StoredProduct {
    snapshot: ProductSnapshot,
    last_sequence: u64,
}

/// In-memory product store keyed by id.
///
/// Test fixture with the real contract semantics: saves are atomic per
/// aggregate, stale writes are rejected by version check, and pending events
/// flush to the bus only after the write. Not a production store.
#[derive(Debug)]
pub struct InMemoryProductRepository<B> {
    records: RwLock<HashMap<ProductId, StoredProduct>>,
    bus: B,
}

impl<B> InMemoryProductRepository<B> {
    pub fn new(bus: B) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            bus,
        }
    }

    fn restore_all<'a>(snapshots: impl Iterator<Item = &'a StoredProduct>) -> Vec<Product> {
        snapshots
            .map(|stored| Product::restore(stored.snapshot.clone()))
            .collect()
    }
}

impl<B> ProductRepository for InMemoryProductRepository<B>
where
    B: EventBus<EventEnvelope<StockEvent>>,
{
    fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;

        Ok(records
            .get(&id)
            .map(|stored| Product::restore(stored.snapshot.clone())))
    }

    fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;

        Ok(ids
            .iter()
            .filter_map(|id| records.get(id))
            .map(|stored| Product::restore(stored.snapshot.clone()))
            .collect())
    }

    fn save(&self, product: &mut Product) -> Result<(), RepositoryError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;

        let snapshot = product.snapshot();

        let mut next_sequence = match records.get(&snapshot.id) {
            Some(existing) => {
                if snapshot.version <= existing.snapshot.version {
                    return Err(RepositoryError::Concurrency(format!(
                        "stale write for product {} (stored version {}, attempted {})",
                        snapshot.id, existing.snapshot.version, snapshot.version
                    )));
                }
                existing.last_sequence
            }
            None => 0,
        };

        let aggregate_id = snapshot.id.0;
        let mut envelopes = Vec::new();
        for event in product.drain_events() {
            next_sequence += 1;
            envelopes.push(EventEnvelope::from_event(
                Uuid::now_v7(),
                aggregate_id,
                PRODUCT_AGGREGATE_TYPE,
                next_sequence,
                event,
            ));
        }

        records.insert(
            snapshot.id,
            StoredProduct {
                snapshot,
                last_sequence: next_sequence,
            },
        );

        // Publish after the write, still under the map lock so per-aggregate
        // publish order matches the assigned sequence numbers.
        for envelope in envelopes {
            self.bus
                .publish(envelope)
                .map_err(|e| RepositoryError::Publish(format!("{e:?}")))?;
        }

        Ok(())
    }

    fn find_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;

        Ok(Self::restore_all(records.values()))
    }

    fn find_by_category(&self, category_id: CategoryId) -> Result<Vec<Product>, RepositoryError> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;

        Ok(Self::restore_all(
            records
                .values()
                .filter(|stored| stored.snapshot.category_id == category_id),
        ))
    }

    fn find_by_artisan(&self, artisan_id: ArtisanId) -> Result<Vec<Product>, RepositoryError> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;

        Ok(Self::restore_all(
            records
                .values()
                .filter(|stored| stored.snapshot.artisan_id == artisan_id),
        ))
    }

    fn find_low_stock(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self
            .find_all()?
            .into_iter()
            .filter(|product| product.stock_status() == StockStatus::LowStock)
            .collect())
    }

    fn find_out_of_stock(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self
            .find_all()?
            .into_iter()
            .filter(|product| product.stock_status() == StockStatus::OutOfStock)
            .collect())
    }
}
