//! Amazon DynamoDB backend.
//!
//! Expects a table keyed by `id` (partition, string) and `location_id`
//! (sort, number) with a global secondary index on `location_id`. Prices are
//! stored as DynamoDB numbers, which keep their decimal text exactly.

use super::{ContinuationToken, InventoryTable, KeyCondition, Page, StoreError};
use crate::models::money::parse_decimal;
use crate::models::{InventoryItem, ItemKey};
use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use std::collections::HashMap;
use tracing::debug;

type Attributes = HashMap<String, AttributeValue>;

#[derive(Debug, Clone)]
pub struct DynamoDbTable {
    client: Client,
    table_name: String,
    location_index: String,
}

impl DynamoDbTable {
    pub fn new(client: Client, table_name: impl Into<String>, location_index: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            location_index: location_index.into(),
        }
    }

    /// Builds a client from the ambient AWS environment (region, credentials).
    pub async fn from_env(table_name: impl Into<String>, location_index: impl Into<String>) -> Self {
        let sdk_config = aws_config::load_from_env().await;
        Self::new(Client::new(&sdk_config), table_name, location_index)
    }
}

fn backend_error<E>(err: E) -> StoreError
where
    E: std::error::Error + 'static,
{
    StoreError::Backend(DisplayErrorContext(err).to_string())
}

fn key_attributes(key: &ItemKey) -> Attributes {
    HashMap::from([
        ("id".to_string(), AttributeValue::S(key.id.clone())),
        (
            "location_id".to_string(),
            AttributeValue::N(key.location_id.to_string()),
        ),
    ])
}

fn item_attributes(item: &InventoryItem) -> Attributes {
    let mut attributes = key_attributes(&item.key());
    attributes.insert("name".to_string(), AttributeValue::S(item.name.clone()));
    attributes.insert(
        "description".to_string(),
        AttributeValue::S(item.description.clone()),
    );
    attributes.insert("qty".to_string(), AttributeValue::N(item.qty.to_string()));
    attributes.insert("price".to_string(), AttributeValue::N(item.price.to_string()));
    attributes
}

fn string_attr<'a>(attributes: &'a Attributes, name: &str) -> Result<&'a String, StoreError> {
    attributes
        .get(name)
        .and_then(|value| value.as_s().ok())
        .ok_or_else(|| StoreError::Malformed(format!("attribute '{}' is not a string", name)))
}

fn number_attr<'a>(attributes: &'a Attributes, name: &str) -> Result<&'a String, StoreError> {
    attributes
        .get(name)
        .and_then(|value| value.as_n().ok())
        .ok_or_else(|| StoreError::Malformed(format!("attribute '{}' is not a number", name)))
}

fn parse_number<T: std::str::FromStr>(attributes: &Attributes, name: &str) -> Result<T, StoreError>
where
    T::Err: std::fmt::Display,
{
    let raw = number_attr(attributes, name)?;
    raw.parse()
        .map_err(|e| StoreError::Malformed(format!("attribute '{}' = {}: {}", name, raw, e)))
}

fn key_from_attributes(attributes: &Attributes) -> Result<ItemKey, StoreError> {
    Ok(ItemKey::new(
        string_attr(attributes, "id")?.clone(),
        parse_number(attributes, "location_id")?,
    ))
}

fn item_from_attributes(attributes: &Attributes) -> Result<InventoryItem, StoreError> {
    let raw_price = number_attr(attributes, "price")?;
    let price = parse_decimal(raw_price)
        .map_err(|e| StoreError::Malformed(format!("attribute 'price' = {}: {}", raw_price, e)))?;
    Ok(InventoryItem {
        id: string_attr(attributes, "id")?.clone(),
        location_id: parse_number(attributes, "location_id")?,
        name: string_attr(attributes, "name")?.clone(),
        description: string_attr(attributes, "description")?.clone(),
        qty: parse_number(attributes, "qty")?,
        price,
    })
}

fn to_page(items: &[Attributes], last_key: Option<&Attributes>) -> Result<Page, StoreError> {
    Ok(Page {
        items: items
            .iter()
            .map(item_from_attributes)
            .collect::<Result<_, _>>()?,
        next: last_key
            .map(key_from_attributes)
            .transpose()?
            .map(ContinuationToken::new),
    })
}

#[async_trait]
impl InventoryTable for DynamoDbTable {
    fn backend_name(&self) -> &'static str {
        "dynamodb"
    }

    async fn get(&self, key: &ItemKey) -> Result<Option<InventoryItem>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key_attributes(key)))
            .send()
            .await
            .map_err(backend_error)?;
        output.item().map(item_from_attributes).transpose()
    }

    async fn put(&self, item: InventoryItem) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item_attributes(&item)))
            .send()
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    async fn delete(&self, key: &ItemKey) -> Result<(), StoreError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(key_attributes(key)))
            .send()
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    async fn query(
        &self,
        condition: &KeyCondition,
        start: Option<ContinuationToken>,
    ) -> Result<Page, StoreError> {
        let request = self
            .client
            .query()
            .table_name(&self.table_name)
            .set_exclusive_start_key(start.map(|token| key_attributes(token.last_key())));
        let request = match condition {
            KeyCondition::Id(id) => request
                .key_condition_expression("id = :id")
                .expression_attribute_values(":id", AttributeValue::S(id.clone())),
            KeyCondition::Location(location_id) => request
                .index_name(&self.location_index)
                .key_condition_expression("location_id = :location_id")
                .expression_attribute_values(
                    ":location_id",
                    AttributeValue::N(location_id.to_string()),
                ),
        };
        let output = request.send().await.map_err(backend_error)?;
        debug!(count = output.count(), "dynamodb query page");
        to_page(output.items(), output.last_evaluated_key())
    }

    async fn scan(&self, start: Option<ContinuationToken>) -> Result<Page, StoreError> {
        let output = self
            .client
            .scan()
            .table_name(&self.table_name)
            .set_exclusive_start_key(start.map(|token| key_attributes(token.last_key())))
            .send()
            .await
            .map_err(backend_error)?;
        debug!(count = output.count(), "dynamodb scan page");
        to_page(output.items(), output.last_evaluated_key())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .describe_table()
            .table_name(&self.table_name)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(DisplayErrorContext(e).to_string()))?;
        Ok(())
    }
}
