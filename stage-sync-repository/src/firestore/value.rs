//! Conversion from plain JSON into Firestore's typed value representation.
//!
//! Firestore's REST API wraps every value in a single-key object naming its
//! type (`stringValue`, `arrayValue`, ...). Arrays may hold maps that hold
//! arrays, but an array may not hold another array directly.

use serde_json::{json, Map, Number, Value};

use crate::errors::StoreError;

/// Encode a document body into the `fields` object of a Firestore document.
pub fn encode_fields(fields: &Map<String, Value>) -> Result<Value, StoreError> {
    let mut encoded = Map::with_capacity(fields.len());
    for (key, value) in fields {
        encoded.insert(key.clone(), encode_value(value, key, false)?);
    }
    Ok(Value::Object(encoded))
}

fn encode_value(value: &Value, path: &str, in_array: bool) -> Result<Value, StoreError> {
    let encoded = match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => encode_number(n, path)?,
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            if in_array {
                return Err(StoreError::NestedArray(path.to_string()));
            }
            let values = items
                .iter()
                .enumerate()
                .map(|(i, item)| encode_value(item, &format!("{}[{}]", path, i), true))
                .collect::<Result<Vec<_>, _>>()?;
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => {
            let mut fields = Map::with_capacity(map.len());
            for (key, item) in map {
                let item_path = format!("{}.{}", path, key);
                fields.insert(key.clone(), encode_value(item, &item_path, false)?);
            }
            json!({ "mapValue": { "fields": fields } })
        }
    };
    Ok(encoded)
}

/// Integers travel as decimal strings; anything outside i64 becomes a double.
fn encode_number(n: &Number, path: &str) -> Result<Value, StoreError> {
    if let Some(i) = n.as_i64() {
        return Ok(json!({ "integerValue": i.to_string() }));
    }
    match n.as_f64() {
        Some(f) if f.is_finite() => Ok(json!({ "doubleValue": f })),
        _ => Err(StoreError::serialization(format!(
            "number at '{}' has no finite double form: {}",
            path, n
        ))),
    }
}
