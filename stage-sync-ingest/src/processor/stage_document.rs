//! Stage document parsing and flattening.

use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::IngestError;

/// Fields that hold grids (arrays of arrays) and are stored as JSON text.
pub const FLATTENED_FIELDS: [&str; 2] = ["puzzle", "solution"];

/// A stage ready to be written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StageDocument {
    id: String,
    fields: Map<String, Value>,
}

impl StageDocument {
    /// Build a stage from parsed JSON.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(StageDocument))` - A stage with its grid fields flattened
    /// * `Ok(None)` - The `id` is missing or falsy; the stage should be skipped
    /// * `Err(IngestError)` - The value is not an object, or `id` is not a string
    pub fn from_value(value: Value) -> Result<Option<Self>, IngestError> {
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Err(IngestError::invalid_stage(format!(
                    "expected a JSON object, got {}",
                    type_name(&other)
                )))
            }
        };

        let id = match fields.get("id") {
            Some(id) if is_truthy(id) => match id {
                Value::String(s) => s.clone(),
                other => {
                    return Err(IngestError::invalid_stage(format!(
                        "'id' must be a string, got {}",
                        other
                    )))
                }
            },
            _ => return Ok(None),
        };

        for key in FLATTENED_FIELDS {
            if let Some(value) = fields.get_mut(key) {
                if value.is_array() {
                    let encoded = value.to_string();
                    *value = Value::String(encoded);
                    debug!(stage_id = %id, field = key, "Flattened grid field");
                }
            }
        }

        Ok(Some(Self { id, fields }))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// JSON truthiness: null, false, zero and empty containers are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
