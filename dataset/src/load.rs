//! FILENAME: dataset/src/load.rs
//! PURPOSE: Turns a JSON array of records into a `Dataset`.
//! CONTEXT: The dashboard's loader fetches the records; this is where they are
//! typed once. Every value becomes text, the same as CSV-sourced fields:
//! numbers and booleans are stringified, `null` is absent.

use serde_json::Value;

use crate::error::{DatasetError, Result};
use crate::logging::CAT_LOAD;
use crate::row::{Dataset, Schema};
use crate::{log_debug, log_info};

fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        // Nested structures are kept verbatim rather than dropped.
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

fn records(json: &str) -> Result<Vec<Vec<(String, String)>>> {
    let parsed: Value = serde_json::from_str(json)?;
    let Value::Array(items) = parsed else {
        return Err(DatasetError::NotAnArray);
    };

    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let Value::Object(map) = item else {
            return Err(DatasetError::NotAnObject(idx));
        };
        let record = map
            .iter()
            .filter_map(|(k, v)| field_text(v).map(|text| (k.clone(), text)))
            .collect();
        out.push(record);
    }
    Ok(out)
}

impl Dataset {
    /// Loads records, inferring the schema from their keys.
    pub fn from_json(json: &str) -> Result<Self> {
        let dataset = Dataset::from_records(records(json)?);
        log_info!(
            CAT_LOAD,
            "loaded rows={} columns={}",
            dataset.len(),
            dataset.schema.len()
        );
        Ok(dataset)
    }

    /// Loads records against a declared schema.
    pub fn from_json_with_schema(schema: Schema, json: &str) -> Result<Self> {
        let records = records(json)?;
        log_debug!(CAT_LOAD, "typing {} records against {} columns", records.len(), schema.len());
        Dataset::with_schema(schema, records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_stringifies_values() {
        let ds = Dataset::from_json(
            r#"[
                {"program": "CS", "amount": 100, "active": true, "note": null},
                {"program": "Math", "amount": "75.5"}
            ]"#,
        )
        .unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.value(&ds.rows[0], "amount"), Some("100"));
        assert_eq!(ds.value(&ds.rows[0], "active"), Some("true"));
        assert_eq!(ds.value(&ds.rows[0], "note"), None);
        assert_eq!(ds.value(&ds.rows[1], "amount"), Some("75.5"));
        assert_eq!(ds.value(&ds.rows[1], "active"), None);
    }

    #[test]
    fn test_from_json_empty_array() {
        let ds = Dataset::from_json("[]").unwrap();
        assert!(ds.is_empty());
        assert!(ds.schema.is_empty());
    }

    #[test]
    fn test_from_json_shape_errors() {
        assert!(matches!(Dataset::from_json(r#"{"a": 1}"#), Err(DatasetError::NotAnArray)));
        assert!(matches!(Dataset::from_json(r#"[{"a": 1}, 2]"#), Err(DatasetError::NotAnObject(1))));
        assert!(matches!(Dataset::from_json("not json"), Err(DatasetError::Json(_))));
    }

    #[test]
    fn test_from_json_with_schema() {
        let schema = Schema::new(["program", "student"]).unwrap();
        let ds = Dataset::from_json_with_schema(schema.clone(), r#"[{"program": "CS"}]"#).unwrap();
        assert_eq!(ds.value(&ds.rows[0], "student"), None);

        let err = Dataset::from_json_with_schema(schema, r#"[{"program": "CS", "x": "1"}]"#)
            .unwrap_err();
        assert!(matches!(err, DatasetError::UndeclaredField { row: 0, .. }));
    }
}
