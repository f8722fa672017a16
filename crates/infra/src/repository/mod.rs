//! Persistence contract for the product stock aggregate.

mod in_memory;

pub use in_memory::InMemoryProductRepository;

use std::sync::Arc;

use thiserror::Error;

use artisania_inventory::{ArtisanId, CategoryId, Product, ProductId};

/// Persistence operation error.
///
/// Infrastructure failures are propagated unchanged to the caller; retry
/// policy belongs to the saga coordinator, never to this layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Optimistic concurrency check failed (stale aggregate version).
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    /// Underlying storage failure.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Event publication failed after a successful write (at-least-once;
    /// the committed state is durable, retrying publication is safe).
    #[error("event publication failed: {0}")]
    Publish(String),
}

/// Store of record for products.
///
/// Implementations must make `save` atomic per aggregate and must enforce a
/// version check so that concurrent writers against the same product cannot
/// interleave: the aggregate itself refuses inconsistent states, but mutual
/// exclusion across requests is this layer's job.
pub trait ProductRepository: Send + Sync {
    fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Load several products at once; unknown ids are skipped.
    fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;

    /// Persist the aggregate and flush its pending events.
    ///
    /// After a successful write the product's buffered events are drained
    /// and delivered to the publisher in emission order, tagged with
    /// per-aggregate sequence numbers. Events are never published before
    /// the commit.
    fn save(&self, product: &mut Product) -> Result<(), RepositoryError>;

    fn find_all(&self) -> Result<Vec<Product>, RepositoryError>;

    fn find_by_category(&self, category_id: CategoryId) -> Result<Vec<Product>, RepositoryError>;

    fn find_by_artisan(&self, artisan_id: ArtisanId) -> Result<Vec<Product>, RepositoryError>;

    fn find_low_stock(&self) -> Result<Vec<Product>, RepositoryError>;

    fn find_out_of_stock(&self) -> Result<Vec<Product>, RepositoryError>;
}

impl<R> ProductRepository for Arc<R>
where
    R: ProductRepository + ?Sized,
{
    fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        (**self).find_by_id(id)
    }

    fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        (**self).find_by_ids(ids)
    }

    fn save(&self, product: &mut Product) -> Result<(), RepositoryError> {
        (**self).save(product)
    }

    fn find_all(&self) -> Result<Vec<Product>, RepositoryError> {
        (**self).find_all()
    }

    fn find_by_category(&self, category_id: CategoryId) -> Result<Vec<Product>, RepositoryError> {
        (**self).find_by_category(category_id)
    }

    fn find_by_artisan(&self, artisan_id: ArtisanId) -> Result<Vec<Product>, RepositoryError> {
        (**self).find_by_artisan(artisan_id)
    }

    fn find_low_stock(&self) -> Result<Vec<Product>, RepositoryError> {
        (**self).find_low_stock()
    }

    fn find_out_of_stock(&self) -> Result<Vec<Product>, RepositoryError> {
        (**self).find_out_of_stock()
    }
}
