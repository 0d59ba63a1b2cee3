use super::{ContinuationToken, InventoryTable, KeyCondition, Page, StoreError};
use crate::models::{InventoryItem, ItemKey};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use tokio::sync::RwLock;

/// Default number of records returned per `query`/`scan` page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Default)]
struct Tables {
    items: BTreeMap<ItemKey, InventoryItem>,
    /// Secondary index ordered by `(location_id, id)`.
    location_index: BTreeSet<(i64, String)>,
}

/// In-memory inventory table with a `location_id` index and fixed page size.
#[derive(Debug)]
pub struct InMemoryTable {
    tables: RwLock<Tables>,
    page_size: usize,
}

impl InMemoryTable {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub async fn len(&self) -> usize {
        self.tables.read().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn paginate<'a>(&self, records: impl Iterator<Item = &'a InventoryItem>) -> Page {
        let mut items: Vec<InventoryItem> = records.take(self.page_size + 1).cloned().collect();
        let next = if items.len() > self.page_size {
            items.truncate(self.page_size);
            items.last().map(|item| ContinuationToken::new(item.key()))
        } else {
            None
        };
        Page { items, next }
    }
}

impl Default for InMemoryTable {
    fn default() -> Self {
        Self::new()
    }
}

fn after(start: Option<&ContinuationToken>, first: ItemKey) -> Bound<ItemKey> {
    match start {
        Some(token) => Bound::Excluded(token.last_key().clone()),
        None => Bound::Included(first),
    }
}

#[async_trait]
impl InventoryTable for InMemoryTable {
    fn backend_name(&self) -> &'static str {
        "in-memory"
    }

    async fn get(&self, key: &ItemKey) -> Result<Option<InventoryItem>, StoreError> {
        Ok(self.tables.read().await.items.get(key).cloned())
    }

    async fn put(&self, item: InventoryItem) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables
            .location_index
            .insert((item.location_id, item.id.clone()));
        tables.items.insert(item.key(), item);
        Ok(())
    }

    async fn delete(&self, key: &ItemKey) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.items.remove(key).is_some() {
            tables
                .location_index
                .remove(&(key.location_id, key.id.clone()));
        }
        Ok(())
    }

    async fn query(
        &self,
        condition: &KeyCondition,
        start: Option<ContinuationToken>,
    ) -> Result<Page, StoreError> {
        let tables = self.tables.read().await;
        let page = match condition {
            KeyCondition::Id(id) => {
                let lower = after(start.as_ref(), ItemKey::new(id.clone(), i64::MIN));
                self.paginate(
                    tables
                        .items
                        .range((lower, Bound::Unbounded))
                        .take_while(|(key, _)| &key.id == id)
                        .map(|(_, item)| item),
                )
            }
            KeyCondition::Location(location_id) => {
                let lower = match &start {
                    Some(token) => {
                        let last = token.last_key();
                        Bound::Excluded((last.location_id, last.id.clone()))
                    }
                    None => Bound::Included((*location_id, String::new())),
                };
                self.paginate(
                    tables
                        .location_index
                        .range((lower, Bound::Unbounded))
                        .take_while(|(location, _)| location == location_id)
                        .filter_map(|(location, id)| {
                            tables.items.get(&ItemKey::new(id.clone(), *location))
                        }),
                )
            }
        };
        Ok(page)
    }

    async fn scan(&self, start: Option<ContinuationToken>) -> Result<Page, StoreError> {
        let tables = self.tables.read().await;
        let records = match start {
            Some(token) => tables
                .items
                .range((Bound::Excluded(token.last_key().clone()), Bound::Unbounded)),
            None => tables.items.range::<ItemKey, _>(..),
        };
        Ok(self.paginate(records.map(|(_, item)| item)))
    }
}
