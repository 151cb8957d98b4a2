//! FILENAME: dataset/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a JSON array of records")]
    NotAnArray,

    #[error("Record {0} is not a JSON object")]
    NotAnObject(usize),

    #[error("Record {row} has field '{field}' which the schema does not declare")]
    UndeclaredField { row: usize, field: String },

    #[error("Duplicate column in schema: {0}")]
    DuplicateColumn(String),
}

pub type Result<T> = std::result::Result<T, DatasetError>;
