use crate::errors::ServiceError;
use crate::models::money::{decimal_from_json, decimal_to_f64, json_type_name};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Fields a create payload must carry, in the order they are reported.
pub const REQUIRED_FIELDS: [&str; 5] = ["name", "description", "qty", "price", "location_id"];

const INVALID_NUMERIC_MESSAGE: &str = "Invalid data type for quantity, price, or location_id";
const INVALID_TEXT_MESSAGE: &str = "Invalid value for name or description";

/// Composite primary key of the inventory table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    pub id: String,
    pub location_id: i64,
}

impl ItemKey {
    pub fn new(id: impl Into<String>, location_id: i64) -> Self {
        Self {
            id: id.into(),
            location_id,
        }
    }
}

/// A stored inventory record. `price` stays an exact decimal at rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: String,
    pub location_id: i64,
    pub name: String,
    pub description: String,
    pub qty: u64,
    pub price: Decimal,
}

impl InventoryItem {
    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.id.clone(), self.location_id)
    }
}

/// JSON rendering of an [`InventoryItem`], with `price` as a JSON number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "0f8fad5b-d9cb-469f-a165-70867728950e",
    "name": "Widget",
    "description": "Blue widget",
    "qty": 12,
    "price": 19.99,
    "location_id": 42
}))]
pub struct ItemView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub qty: u64,
    pub price: f64,
    pub location_id: i64,
}

impl From<&InventoryItem> for ItemView {
    fn from(item: &InventoryItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            description: item.description.clone(),
            qty: item.qty,
            price: decimal_to_f64(&item.price),
            location_id: item.location_id,
        }
    }
}

/// A validated create payload. The identifier is minted by the service.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct NewInventoryItem {
    #[validate(custom = "validate_not_blank")]
    pub name: String,
    #[validate(custom = "validate_not_blank")]
    pub description: String,
    pub qty: u64,
    #[validate(custom = "validate_non_negative")]
    pub price: Decimal,
    pub location_id: i64,
}

impl NewInventoryItem {
    /// Validates and coerces a raw create payload.
    ///
    /// Missing (or `null`) required fields are reported together; a client
    /// supplied `id` is ignored.
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, ServiceError> {
        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|field| payload.get(**field).map_or(true, Value::is_null))
            .map(|field| field.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ServiceError::missing_fields(missing));
        }

        let name = text_field(payload, "name")?;
        let description = text_field(payload, "description")?;

        let invalid = |e: String| ServiceError::validation_with_detail(INVALID_NUMERIC_MESSAGE, e);
        let qty = integer_field(payload, "qty")
            .and_then(|qty| u64::try_from(qty).map_err(|_| format!("qty: {} is negative", qty)))
            .map_err(invalid)?;
        let price = decimal_from_json(&payload["price"])
            .map_err(|e| format!("price: {}", e))
            .map_err(invalid)?;
        let location_id = integer_field(payload, "location_id").map_err(invalid)?;

        let item = Self {
            name,
            description,
            qty,
            price,
            location_id,
        };
        item.validate().map_err(|e| {
            let message = if e.field_errors().contains_key("price") {
                INVALID_NUMERIC_MESSAGE
            } else {
                INVALID_TEXT_MESSAGE
            };
            ServiceError::validation_with_detail(message, e.to_string())
        })?;
        Ok(item)
    }

    pub fn into_item(self, id: String) -> InventoryItem {
        InventoryItem {
            id,
            location_id: self.location_id,
            name: self.name,
            description: self.description,
            qty: self.qty,
            price: self.price,
        }
    }
}

fn text_field(payload: &Map<String, Value>, field: &str) -> Result<String, ServiceError> {
    match &payload[field] {
        Value::String(text) => Ok(text.clone()),
        other => Err(ServiceError::validation_with_detail(
            INVALID_TEXT_MESSAGE,
            format!("{}: expected a string, got {}", field, json_type_name(other)),
        )),
    }
}

/// Accepts JSON integers, integral floats and integer strings.
fn integer_field(payload: &Map<String, Value>, field: &str) -> Result<i64, String> {
    parse_integer(&payload[field]).map_err(|e| format!("{}: {}", field, e))
}

fn parse_integer(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                return Ok(int);
            }
            match number.as_f64() {
                Some(float)
                    if float.fract() == 0.0
                        && float >= i64::MIN as f64
                        && float < i64::MAX as f64 =>
                {
                    Ok(float as i64)
                }
                _ => Err(format!("{} is not a 64-bit integer", number)),
            }
        }
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("'{}' is not an integer: {}", text, e)),
        other => Err(format!("expected an integer, got {}", json_type_name(other))),
    }
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must be a non-empty string".into());
        return Err(err);
    }
    Ok(())
}

fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("negative");
        err.message = Some("must not be negative".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object payload")
    }

    fn full_payload() -> Map<String, Value> {
        payload(json!({
            "name": "Widget",
            "description": "Blue widget",
            "qty": 12,
            "price": 19.99,
            "location_id": 42
        }))
    }

    #[test]
    fn well_typed_payload_is_accepted() {
        let item = NewInventoryItem::from_payload(&full_payload()).unwrap();
        assert_eq!(item.name, "Widget");
        assert_eq!(item.qty, 12);
        assert_eq!(item.price, dec!(19.99));
        assert_eq!(item.location_id, 42);
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let mut body = full_payload();
        body.insert("qty".into(), json!("7"));
        body.insert("price".into(), json!("3.50"));
        body.insert("location_id".into(), json!(" 9 "));
        let item = NewInventoryItem::from_payload(&body).unwrap();
        assert_eq!(item.qty, 7);
        assert_eq!(item.price, dec!(3.50));
        assert_eq!(item.location_id, 9);
    }

    #[test]
    fn integral_float_quantity_is_accepted() {
        let mut body = full_payload();
        body.insert("qty".into(), json!(5.0));
        assert_eq!(NewInventoryItem::from_payload(&body).unwrap().qty, 5);
    }

    #[rstest]
    #[case(&["qty"])]
    #[case(&["name", "price"])]
    #[case(&["description", "location_id"])]
    #[case(&["name", "description", "qty", "price", "location_id"])]
    fn missing_fields_are_reported_exactly(#[case] removed: &[&str]) {
        let mut body = full_payload();
        for field in removed {
            body.remove(*field);
        }
        let err = NewInventoryItem::from_payload(&body).unwrap_err();
        assert_matches!(err, ServiceError::ValidationError { missing_fields, .. } => {
            let expected: Vec<String> = REQUIRED_FIELDS
                .iter()
                .filter(|f| removed.contains(*f))
                .map(|f| f.to_string())
                .collect();
            assert_eq!(missing_fields, expected);
        });
    }

    #[test]
    fn null_counts_as_missing() {
        let mut body = full_payload();
        body.insert("price".into(), Value::Null);
        let err = NewInventoryItem::from_payload(&body).unwrap_err();
        assert_matches!(err, ServiceError::ValidationError { missing_fields, .. } if missing_fields == vec!["price".to_string()]);
    }

    #[rstest]
    #[case("qty", json!("abc"))]
    #[case("qty", json!(2.5))]
    #[case("qty", json!(-1))]
    #[case("price", json!("cheap"))]
    #[case("price", json!(-0.01))]
    #[case("location_id", json!("north"))]
    #[case("location_id", json!(true))]
    fn uncoercible_numbers_are_validation_errors(#[case] field: &str, #[case] value: Value) {
        let mut body = full_payload();
        body.insert(field.into(), value);
        let err = NewInventoryItem::from_payload(&body).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        assert_matches!(err, ServiceError::ValidationError { message, detail: Some(_), .. } => {
            assert_eq!(message, INVALID_NUMERIC_MESSAGE);
        });
    }

    #[rstest]
    #[case("name", json!(""))]
    #[case("description", json!("   "))]
    #[case("name", json!(17))]
    fn blank_or_non_string_text_is_rejected(#[case] field: &str, #[case] value: Value) {
        let mut body = full_payload();
        body.insert(field.into(), value);
        let err = NewInventoryItem::from_payload(&body).unwrap_err();
        assert_matches!(err, ServiceError::ValidationError { message, .. } => {
            assert_eq!(message, INVALID_TEXT_MESSAGE);
        });
    }

    #[test]
    fn client_supplied_id_is_ignored() {
        let mut body = full_payload();
        body.insert("id".into(), json!("client-chosen"));
        let item = NewInventoryItem::from_payload(&body)
            .unwrap()
            .into_item("minted".into());
        assert_eq!(item.id, "minted");
    }

    #[test]
    fn view_renders_price_as_number() {
        let item = NewInventoryItem::from_payload(&full_payload())
            .unwrap()
            .into_item("abc".into());
        let json = serde_json::to_value(ItemView::from(&item)).unwrap();
        assert_eq!(json["price"], json!(19.99));
        assert_eq!(json["qty"], json!(12));
        assert_eq!(json["location_id"], json!(42));
    }
}
