/*!
 * # Inventory Table
 *
 * The storage contract every backend implements. Point operations address a
 * record by its composite key; `query` and `scan` return one page at a time
 * together with an opaque continuation token when more records remain.
 */

use crate::models::{InventoryItem, ItemKey};
use async_trait::async_trait;
use thiserror::Error;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;
pub mod memory;

pub use memory::InMemoryTable;

/// Table operation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Table unavailable: {0}")]
    Unavailable(String),
    #[error("Malformed record: {0}")]
    Malformed(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Marks where the next `query`/`scan` call resumes. Holds the key of the last
/// record returned, so it is only meaningful to the backend that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationToken(ItemKey);

impl ContinuationToken {
    pub fn new(last_key: ItemKey) -> Self {
        Self(last_key)
    }

    pub fn last_key(&self) -> &ItemKey {
        &self.0
    }
}

/// Key condition for a `query` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyCondition {
    /// Every record whose partition key equals `id` (one per location).
    Id(String),
    /// Every record at a location, served by the `location_id` secondary index.
    Location(i64),
}

/// One page of a `query` or `scan`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<InventoryItem>,
    pub next: Option<ContinuationToken>,
}

/// Storage contract for the inventory table. Single-item operations are
/// atomic; `delete` of an absent key succeeds.
#[async_trait]
pub trait InventoryTable: Send + Sync {
    /// Short backend name reported by health checks.
    fn backend_name(&self) -> &'static str;

    async fn get(&self, key: &ItemKey) -> Result<Option<InventoryItem>, StoreError>;

    /// Inserts or replaces the record at `item.key()`.
    async fn put(&self, item: InventoryItem) -> Result<(), StoreError>;

    async fn delete(&self, key: &ItemKey) -> Result<(), StoreError>;

    async fn query(
        &self,
        condition: &KeyCondition,
        start: Option<ContinuationToken>,
    ) -> Result<Page, StoreError>;

    async fn scan(&self, start: Option<ContinuationToken>) -> Result<Page, StoreError>;

    /// Checks that the table is reachable.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
