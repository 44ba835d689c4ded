//! Entity store
//!
//! Generic repository abstraction over the relational tables. Services only
//! talk to `Store<T>`; `mysql` backs it with sqlx and `memory` with a locked
//! map used by tests and local runs.

pub mod memory;
pub mod mysql;
pub mod sql;

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::IntoParams;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique key violation; carries the key name.
    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("decode error: {0}")]
    Decode(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A value persisted in its own table, keyed by a store-assigned id.
pub trait Entity: Clone + Send + Sync + 'static {
    type Filter: Filter<Self>;

    const NAME: &'static str;

    fn id(&self) -> u64;

    fn set_id(&mut self, id: u64);

    /// Unique keys other than the id, as `(key name, normalized value)`.
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Default listing order.
    fn listing_order(a: &Self, b: &Self) -> Ordering;
}

/// Query specification for an entity. `matches` is the reference semantics;
/// SQL backends translate the same fields into a WHERE clause.
pub trait Filter<T>: Default + Send + Sync {
    fn matches(&self, item: &T) -> bool;
}

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
pub struct PageRequest {
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
    /// Items per page
    pub per_page: Option<u32>,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
        }
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE)
    }

    pub fn offset(&self) -> u64 {
        (self.page() as u64 - 1) * self.per_page() as u64
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

#[async_trait]
pub trait Store<T: Entity>: Send + Sync {
    async fn find_by_id(&self, id: u64) -> StoreResult<Option<T>>;

    /// First match in listing order.
    async fn find_one(&self, filter: &T::Filter) -> StoreResult<Option<T>>;

    /// All matches in listing order, optionally restricted to one page.
    async fn find_all(&self, filter: &T::Filter, page: Option<PageRequest>) -> StoreResult<Vec<T>>;

    async fn count(&self, filter: &T::Filter) -> StoreResult<u64>;

    /// Inserts when `id() == 0` (assigning the id), updates otherwise.
    async fn save(&self, entity: T) -> StoreResult<T>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: u64) -> StoreResult<bool>;
}

pub type SharedStore<T> = Arc<dyn Store<T>>;

/// Count and fetch one page with the same filter.
pub async fn find_page<T: Entity>(
    store: &dyn Store<T>,
    filter: &T::Filter,
    page: PageRequest,
) -> StoreResult<Page<T>> {
    let total = store.count(filter).await?;
    let data = store.find_all(filter, Some(page)).await?;

    Ok(Page {
        data,
        page: page.page(),
        per_page: page.per_page(),
        total,
    })
}
