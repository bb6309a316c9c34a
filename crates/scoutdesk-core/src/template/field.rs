use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::Value;

use super::TemplateError;
use crate::validation::value_to_text;

/// Anything a template can read field values from.
pub trait FieldSource {
    /// Text for `key`, `None` when the field is missing or null.
    fn field_text(&self, key: &str) -> Option<String>;
}

impl FieldSource for Value {
    /// Dotted keys (`apoderado.nombre`) walk nested objects.
    fn field_text(&self, key: &str) -> Option<String> {
        let mut current = self;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        match current {
            Value::Null => None,
            other => Some(value_to_text(other)),
        }
    }
}

impl FieldSource for HashMap<String, String> {
    fn field_text(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl FieldSource for BTreeMap<String, String> {
    fn field_text(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Serialize a record into a JSON object usable as a field source.
pub fn to_source<T: Serialize>(record: &T) -> Result<Value, TemplateError> {
    Ok(serde_json::to_value(record)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_source_handles_types() {
        let record = json!({
            "nombre": "Ana",
            "edad": 13,
            "activo": true,
            "becado": false,
            "nota": null,
            "apoderado": {"nombre": "Rosa Vega", "celular": "987111222"}
        });

        assert_eq!(record.field_text("nombre").as_deref(), Some("Ana"));
        assert_eq!(record.field_text("edad").as_deref(), Some("13"));
        assert_eq!(record.field_text("activo").as_deref(), Some("Sí"));
        assert_eq!(record.field_text("becado").as_deref(), Some("No"));
        assert_eq!(record.field_text("nota"), None);
        assert_eq!(record.field_text("inexistente"), None);
        assert_eq!(record.field_text("apoderado.nombre").as_deref(), Some("Rosa Vega"));
        assert_eq!(record.field_text("apoderado.email"), None);
    }

    #[test]
    fn test_map_source() {
        let mut map = HashMap::new();
        map.insert("lugar".to_string(), "Lima".to_string());
        assert_eq!(map.field_text("lugar").as_deref(), Some("Lima"));
        assert_eq!(map.field_text("fecha"), None);
    }
}
