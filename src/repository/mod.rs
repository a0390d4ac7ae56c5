use chrono::NaiveDateTime;

use crate::db::{DbConnection, DbPool};
use crate::domain::post::{NewPostLog, PostLog};
use crate::domain::product::{NewProduct, Product, ProductListQuery};
use crate::domain::research::{NewResearchLog, ResearchLog};

pub mod errors;
pub mod post;
pub mod product;
pub mod research;

#[cfg(test)]
pub mod mock;

pub use errors::{RepositoryError, RepositoryResult};

#[derive(Clone)]
/// Diesel-backed repository implementation that wraps an r2d2 pool.
pub struct DieselRepository {
    pool: DbPool, // r2d2::Pool is cheap to clone
}

impl DieselRepository {
    /// Create a new repository using the provided connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

/// Read-only operations over product records.
pub trait ProductReader {
    fn get_product_by_item_id(&self, item_id: &str) -> RepositoryResult<Option<Product>>;
    fn list_products(&self, query: ProductListQuery) -> RepositoryResult<Vec<Product>>;
}

/// Write operations over product records.
pub trait ProductWriter {
    /// Insert a product or refresh the descriptive fields of an existing `item_id`.
    fn upsert_product(&self, new_product: &NewProduct) -> RepositoryResult<Product>;
    /// Increment `post_count` by one and stamp `last_posted_at`.
    fn record_successful_post(
        &self,
        item_id: &str,
        posted_at: NaiveDateTime,
    ) -> RepositoryResult<Product>;
    fn set_product_active(&self, item_id: &str, is_active: bool) -> RepositoryResult<Product>;
}

/// Read-only operations over the publish log.
pub trait PostLogReader {
    fn list_recent_posts(&self, limit: usize) -> RepositoryResult<Vec<PostLog>>;
}

/// Append-only operations over the publish log.
pub trait PostLogWriter {
    fn append_post_log(&self, entry: &NewPostLog) -> RepositoryResult<PostLog>;
}

/// Read-only access to stored product research.
pub trait ResearchLogReader {
    /// Most recently stored batch, if any.
    fn latest_research(&self) -> RepositoryResult<Option<ResearchLog>>;
}

pub trait ResearchLogWriter {
    fn append_research_log(&self, entry: &NewResearchLog) -> RepositoryResult<ResearchLog>;
}
