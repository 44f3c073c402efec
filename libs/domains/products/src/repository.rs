use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ProductResult;
use crate::models::{CreateProduct, FilterSpec, Product, UpdateProduct};

/// Repository trait for Product persistence
///
/// Defines the data access interface for products. `find_page` and `count`
/// take the same [`FilterSpec`] so a listing's page and total always agree
/// on the filtered universe.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Persist a new product (with its derived discount price)
    async fn create(&self, input: CreateProduct) -> ProductResult<Product>;

    /// Get a product by ID
    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>>;

    /// Fetch one page of products: filters, then sort, then skip/limit
    async fn find_page(&self, spec: &FilterSpec) -> ProductResult<Vec<Product>>;

    /// Count all products matching the filters, ignoring pagination and sort
    async fn count(&self, spec: &FilterSpec) -> ProductResult<u64>;

    /// Apply a partial update and recompute the discount price
    async fn update(&self, id: Uuid, input: UpdateProduct) -> ProductResult<Product>;
}
