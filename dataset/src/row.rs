//! FILENAME: dataset/src/row.rs
//! PURPOSE: The typed row abstraction the whole dashboard reads from.
//! CONTEXT: A `Schema` declares the columns of one dataset. Every `Row` stores
//! its raw text values by `FieldIndex`, so a field lookup never re-validates
//! anything. A field missing from a record is stored as `None` ("absent").

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, Result};

/// Index of a declared column (0-based, in declaration order).
pub type FieldIndex = usize;

// ============================================================================
// SCHEMA
// ============================================================================

/// The declared columns of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Schema {
    columns: Vec<String>,
    index: FxHashMap<String, FieldIndex>,
}

impl TryFrom<Vec<String>> for Schema {
    type Error = DatasetError;

    fn try_from(columns: Vec<String>) -> Result<Self> {
        Schema::new(columns)
    }
}

impl From<Schema> for Vec<String> {
    fn from(schema: Schema) -> Self {
        schema.columns
    }
}

impl Schema {
    /// Creates a schema from column names. Duplicates are rejected.
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut schema = Schema::default();
        for column in columns {
            let column = column.into();
            if schema.index.contains_key(&column) {
                return Err(DatasetError::DuplicateColumn(column));
            }
            schema.push(column);
        }
        Ok(schema)
    }

    fn push(&mut self, column: String) -> FieldIndex {
        let idx = self.columns.len();
        self.index.insert(column.clone(), idx);
        self.columns.push(column);
        idx
    }

    /// Returns the index of `column`, or `None` if it is not declared.
    pub fn field_index(&self, column: &str) -> Option<FieldIndex> {
        self.index.get(column).copied()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.field_index(column).is_some()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// ============================================================================
// ROW
// ============================================================================

/// One immutable record. Values are indexed by the schema's `FieldIndex`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    values: Vec<Option<String>>,
}

impl Row {
    pub fn new(values: Vec<Option<String>>) -> Self {
        Row { values }
    }

    /// Raw value at a field index. Out-of-range and absent both give `None`.
    pub fn get(&self, field: FieldIndex) -> Option<&str> {
        self.values.get(field).and_then(|v| v.as_deref())
    }

    /// Raw value of a resolved column. An unresolved column reads as absent.
    pub fn value(&self, field: Option<FieldIndex>) -> Option<&str> {
        field.and_then(|f| self.get(f))
    }

    /// Looks a column up by name through the schema.
    pub fn get_by_name<'a>(&'a self, schema: &Schema, column: &str) -> Option<&'a str> {
        self.value(schema.field_index(column))
    }

    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }
}

// ============================================================================
// DATASET
// ============================================================================

/// A loaded dataset: its schema plus rows in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub schema: Schema,
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn new(schema: Schema, rows: Vec<Row>) -> Self {
        Dataset { schema, rows }
    }

    /// The dataset a failed load degrades to.
    pub fn empty() -> Self {
        Dataset::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    /// Reads one column of one row by name.
    pub fn value<'a>(&self, row: &'a Row, column: &str) -> Option<&'a str> {
        row.get_by_name(&self.schema, column)
    }

    /// Distinct present values of a column, in first-seen order.
    pub fn distinct_values(&self, column: &str) -> Vec<String> {
        let Some(field) = self.schema.field_index(column) else {
            return Vec::new();
        };
        let mut seen = rustc_hash::FxHashSet::default();
        let mut out = Vec::new();
        for row in &self.rows {
            if let Some(v) = row.get(field) {
                if seen.insert(v) {
                    out.push(v.to_string());
                }
            }
        }
        out
    }

    /// Builds the schema from the union of record keys, in first-seen order.
    pub fn from_records<I, K, V>(records: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut schema = Schema::default();
        let mut rows = Vec::new();
        for record in records {
            let mut values: Vec<Option<String>> = vec![None; schema.len()];
            for (key, value) in record {
                let key = key.into();
                let idx = match schema.field_index(&key) {
                    Some(idx) => idx,
                    None => schema.push(key),
                };
                if values.len() <= idx {
                    values.resize(idx + 1, None);
                }
                values[idx] = Some(value.into());
            }
            rows.push(values);
        }

        // Earlier rows may be shorter than the final schema.
        let width = schema.len();
        let rows = rows
            .into_iter()
            .map(|mut values| {
                values.resize(width, None);
                Row::new(values)
            })
            .collect();

        Dataset { schema, rows }
    }

    /// Types records against a declared schema. Fields the schema does not
    /// declare are rejected; declared fields missing from a record are absent.
    pub fn with_schema<I, K, V>(schema: Schema, records: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut rows = Vec::new();
        for (row_idx, record) in records.into_iter().enumerate() {
            let mut values: Vec<Option<String>> = vec![None; schema.len()];
            for (key, value) in record {
                let key = key.as_ref();
                let idx = schema
                    .field_index(key)
                    .ok_or_else(|| DatasetError::UndeclaredField {
                        row: row_idx,
                        field: key.to_string(),
                    })?;
                values[idx] = Some(value.into());
            }
            rows.push(Row::new(values));
        }
        Ok(Dataset { schema, rows })
    }
}
