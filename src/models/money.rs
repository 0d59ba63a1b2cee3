//! Monetary values are held as [`Decimal`] everywhere inside the service.
//! Conversion to binary floating point happens only here, when a record is
//! rendered for a JSON response.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Parses decimal text, accepting plain (`19.99`) and scientific (`1.999e1`)
/// notation.
pub fn parse_decimal(text: &str) -> Result<Decimal, rust_decimal::Error> {
    let text = text.trim();
    Decimal::from_str(text).or_else(|_| Decimal::from_scientific(text))
}

/// Reads an exact decimal from a JSON number or numeric string.
///
/// Numbers are converted through their shortest decimal text, so a payload
/// carrying `19.99` becomes exactly `19.99` rather than the nearest binary
/// fraction.
pub fn decimal_from_json(value: &Value) -> Result<Decimal, String> {
    let text = match value {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        other => return Err(format!("expected a number, got {}", json_type_name(other))),
    };
    parse_decimal(&text).map_err(|e| format!("'{}' is not a valid decimal: {}", text, e))
}

/// The only decimal-to-float conversion in the crate. The float is parsed from
/// the decimal's text so it is the closest double to the exact value, which
/// serializes back as the same short literal.
pub fn decimal_to_f64(value: &Decimal) -> f64 {
    value
        .to_string()
        .parse::<f64>()
        .ok()
        .or_else(|| value.to_f64())
        .unwrap_or_default()
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
