use crate::{
    errors::ServiceError,
    models::{InventoryItem, ItemKey, NewInventoryItem},
    store::{ContinuationToken, InventoryTable, KeyCondition, Page, StoreError},
};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

const CREATE_FAILURE: &str = "Error adding inventory item";
const GET_FAILURE: &str = "Error retrieving inventory item";
const LIST_BY_LOCATION_FAILURE: &str = "Error retrieving inventory items by location";
const DELETE_FAILURE: &str = "Error deleting inventory item";
const LIST_ALL_FAILURE: &str = "Error retrieving inventory items";

/// Service for managing inventory records over an injected table.
#[derive(Clone)]
pub struct InventoryService {
    table: Arc<dyn InventoryTable>,
}

impl std::fmt::Debug for InventoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryService")
            .field("backend", &self.table.backend_name())
            .finish()
    }
}

fn failure(context: &'static str) -> impl Fn(StoreError) -> ServiceError {
    move |e| {
        error!(error = %e, "{}", context);
        ServiceError::internal(context, e)
    }
}

impl InventoryService {
    /// Creates a new inventory service instance
    pub fn new(table: Arc<dyn InventoryTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &Arc<dyn InventoryTable> {
        &self.table
    }

    /// Writes a new record under a freshly minted identifier.
    #[instrument(skip(self, new_item), fields(location_id = new_item.location_id))]
    pub async fn create_item(
        &self,
        new_item: NewInventoryItem,
    ) -> Result<InventoryItem, ServiceError> {
        let item = new_item.into_item(Uuid::new_v4().to_string());
        self.table
            .put(item.clone())
            .await
            .map_err(failure(CREATE_FAILURE))?;
        info!(item_id = %item.id, "Inventory item created");
        Ok(item)
    }

    /// Returns the first record stored under `id`. When an id exists at more
    /// than one location, which one comes back is up to the backend.
    #[instrument(skip(self))]
    pub async fn get_item(&self, id: &str) -> Result<InventoryItem, ServiceError> {
        let condition = KeyCondition::Id(id.to_string());
        let mut start = None;
        loop {
            let page = self
                .table
                .query(&condition, start)
                .await
                .map_err(failure(GET_FAILURE))?;
            if let Some(item) = page.items.into_iter().next() {
                return Ok(item);
            }
            match page.next {
                Some(token) => start = Some(token),
                None => break,
            }
        }
        info!(item_id = %id, "Inventory item not found");
        Err(ServiceError::NotFound(format!(
            "Item with ID {} not found",
            id
        )))
    }

    /// Every record at `location_id`, read from the location index.
    #[instrument(skip(self))]
    pub async fn list_items_by_location(
        &self,
        location_id: i64,
    ) -> Result<Vec<InventoryItem>, ServiceError> {
        let condition = KeyCondition::Location(location_id);
        let items = collect_pages(|start| self.table.query(&condition, start))
            .await
            .map_err(failure(LIST_BY_LOCATION_FAILURE))?;
        debug!(count = items.len(), "Listed inventory items by location");
        Ok(items)
    }

    /// Deletes the record at `(id, location_id)` after confirming it exists.
    ///
    /// The check and the delete are two separate table calls. A concurrent
    /// delete in between still reports success because table deletes are
    /// idempotent.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: &str, location_id: i64) -> Result<(), ServiceError> {
        let key = ItemKey::new(id, location_id);
        let existing = self
            .table
            .get(&key)
            .await
            .map_err(failure(DELETE_FAILURE))?;
        if existing.is_none() {
            info!(item_id = %id, location_id, "Inventory item not found for delete");
            return Err(ServiceError::NotFound(format!(
                "Item with ID {} and location {} not found",
                id, location_id
            )));
        }
        self.table
            .delete(&key)
            .await
            .map_err(failure(DELETE_FAILURE))?;
        info!(item_id = %id, location_id, "Inventory item deleted");
        Ok(())
    }

    /// Full table scan.
    #[instrument(skip(self))]
    pub async fn list_all_items(&self) -> Result<Vec<InventoryItem>, ServiceError> {
        let items = collect_pages(|start| self.table.scan(start))
            .await
            .map_err(failure(LIST_ALL_FAILURE))?;
        debug!(count = items.len(), "Listed all inventory items");
        Ok(items)
    }
}

/// Follows continuation tokens until the backend reports no further pages.
async fn collect_pages<F, Fut>(mut fetch: F) -> Result<Vec<InventoryItem>, StoreError>
where
    F: FnMut(Option<ContinuationToken>) -> Fut,
    Fut: std::future::Future<Output = Result<Page, StoreError>>,
{
    let mut items = Vec::new();
    let mut start = None;
    loop {
        let page = fetch(start).await?;
        items.extend(page.items);
        match page.next {
            Some(token) => start = Some(token),
            None => return Ok(items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryTable;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    fn new_item(name: &str, location_id: i64) -> NewInventoryItem {
        NewInventoryItem {
            name: name.to_string(),
            description: "test item".to_string(),
            qty: 4,
            price: dec!(19.99),
            location_id,
        }
    }

    fn service_with_page_size(page_size: usize) -> InventoryService {
        InventoryService::new(Arc::new(InMemoryTable::with_page_size(page_size)))
    }

    struct FailingTable;

    #[async_trait]
    impl InventoryTable for FailingTable {
        fn backend_name(&self) -> &'static str {
            "failing"
        }

        async fn get(&self, _key: &ItemKey) -> Result<Option<InventoryItem>, StoreError> {
            Err(StoreError::Unavailable("table offline".into()))
        }

        async fn put(&self, _item: InventoryItem) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("table offline".into()))
        }

        async fn delete(&self, _key: &ItemKey) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("table offline".into()))
        }

        async fn query(
            &self,
            _condition: &KeyCondition,
            _start: Option<ContinuationToken>,
        ) -> Result<Page, StoreError> {
            Err(StoreError::Unavailable("table offline".into()))
        }

        async fn scan(&self, _start: Option<ContinuationToken>) -> Result<Page, StoreError> {
            Err(StoreError::Unavailable("table offline".into()))
        }
    }

    /// Another writer removes the record between our existence check and our delete.
    struct ConcurrentDeleteTable {
        inner: InMemoryTable,
    }

    #[async_trait]
    impl InventoryTable for ConcurrentDeleteTable {
        fn backend_name(&self) -> &'static str {
            "concurrent-delete"
        }

        async fn get(&self, key: &ItemKey) -> Result<Option<InventoryItem>, StoreError> {
            let found = self.inner.get(key).await?;
            self.inner.delete(key).await?;
            Ok(found)
        }

        async fn put(&self, item: InventoryItem) -> Result<(), StoreError> {
            self.inner.put(item).await
        }

        async fn delete(&self, key: &ItemKey) -> Result<(), StoreError> {
            self.inner.delete(key).await
        }

        async fn query(
            &self,
            condition: &KeyCondition,
            start: Option<ContinuationToken>,
        ) -> Result<Page, StoreError> {
            self.inner.query(condition, start).await
        }

        async fn scan(&self, start: Option<ContinuationToken>) -> Result<Page, StoreError> {
            self.inner.scan(start).await
        }
    }

    #[tokio::test]
    async fn delete_succeeds_when_record_vanishes_before_removal() {
        let service = InventoryService::new(Arc::new(ConcurrentDeleteTable {
            inner: InMemoryTable::new(),
        }));
        let first = service.create_item(new_item("widget", 5)).await.unwrap();
        let second = service.create_item(new_item("gadget", 5)).await.unwrap();

        assert_matches!(service.delete_item(&first.id, 5).await, Ok(()));
        assert!(service
            .table()
            .get(&ItemKey::new(&first.id, 5))
            .await
            .unwrap()
            .is_none());

        let request = crate::handlers::gateway::GatewayRequest::default()
            .with_path_parameter("id", second.id.clone())
            .with_query_parameter("location_id", "5");
        let response = crate::handlers::gateway::delete_item(&service, &request).await;
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        assert_eq!(
            response.body_json().unwrap()["message"],
            format!("Successfully deleted inventory item with ID {}", second.id)
        );
    }

    #[tokio::test]
    async fn created_ids_are_unique() {
        let service = service_with_page_size(10);
        let mut ids = HashSet::new();
        for n in 0..50 {
            let item = service.create_item(new_item("widget", n % 4)).await.unwrap();
            assert!(ids.insert(item.id));
        }
    }

    #[tokio::test]
    async fn get_returns_a_record_for_a_multi_location_id() {
        let service = service_with_page_size(1);
        let created = service.create_item(new_item("widget", 3)).await.unwrap();
        let mut twin = created.clone();
        twin.location_id = 9;
        service.table().put(twin).await.unwrap();

        let found = service.get_item(&created.id).await.unwrap();
        assert_eq!(found.id, created.id);
        assert!([3, 9].contains(&found.location_id));
    }

    #[tokio::test]
    async fn get_of_unknown_id_is_not_found() {
        let service = service_with_page_size(10);
        let err = service.get_item("nope").await.unwrap_err();
        assert_eq!(err, ServiceError::NotFound("Item with ID nope not found".into()));
    }

    #[tokio::test]
    async fn location_listing_follows_continuations() {
        let service = service_with_page_size(2);
        for _ in 0..5 {
            service.create_item(new_item("here", 42)).await.unwrap();
        }
        service.create_item(new_item("there", 7)).await.unwrap();

        let items = service.list_items_by_location(42).await.unwrap();
        assert_eq!(items.len(), 5);
        assert!(items.iter().all(|item| item.location_id == 42));
        assert!(service.list_items_by_location(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_requires_the_exact_composite_key() {
        let service = service_with_page_size(10);
        let item = service.create_item(new_item("widget", 5)).await.unwrap();

        let err = service.delete_item(&item.id, 6).await.unwrap_err();
        assert_eq!(
            err,
            ServiceError::NotFound(format!("Item with ID {} and location 6 not found", item.id))
        );
        assert_eq!(service.list_all_items().await.unwrap().len(), 1);

        service.delete_item(&item.id, 5).await.unwrap();
        assert!(service.list_all_items().await.unwrap().is_empty());
        assert_matches!(
            service.get_item(&item.id).await,
            Err(ServiceError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn list_all_counts_every_create() {
        let service = service_with_page_size(3);
        assert!(service.list_all_items().await.unwrap().is_empty());
        for n in 0..7 {
            service.create_item(new_item("widget", n)).await.unwrap();
        }
        assert_eq!(service.list_all_items().await.unwrap().len(), 7);
    }

    #[tokio::test]
    async fn store_failures_carry_the_operation_message() {
        let service = InventoryService::new(Arc::new(FailingTable));

        let expect = |result: ServiceError, context: &str| {
            assert_matches!(result, ServiceError::InternalError { context: c, error } => {
                assert_eq!(c, context);
                assert_eq!(error, "Table unavailable: table offline");
            });
        };
        expect(
            service.create_item(new_item("w", 1)).await.unwrap_err(),
            CREATE_FAILURE,
        );
        expect(service.get_item("a").await.unwrap_err(), GET_FAILURE);
        expect(
            service.list_items_by_location(1).await.unwrap_err(),
            LIST_BY_LOCATION_FAILURE,
        );
        expect(service.delete_item("a", 1).await.unwrap_err(), DELETE_FAILURE);
        expect(service.list_all_items().await.unwrap_err(), LIST_ALL_FAILURE);
    }
}
