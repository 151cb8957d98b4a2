//! FILENAME: linking-engine/src/error.rs

use dataset::DatasetError;
use thiserror::Error;

/// Wiring and configuration errors. Data-shape problems never end up here;
/// they degrade to absent values or empty results instead.
#[derive(Error, Debug)]
pub enum LinkingError {
    #[error("Unknown axis: {0}")]
    UnknownAxis(String),

    #[error("Unknown view: {0}")]
    UnknownView(String),

    #[error("Duplicate axis: {0}")]
    DuplicateAxis(String),

    #[error("Duplicate view: {0}")]
    DuplicateView(String),

    #[error("View '{view}' lists rows at '{column}', which is not one of its group columns")]
    LevelNotGrouped { view: String, column: String },

    #[error("Adjacency index over ({index_a}, {index_b}) does not lead from '{from}' to '{to}'")]
    AdjacencyMismatch {
        from: String,
        to: String,
        index_a: String,
        index_b: String,
    },

    #[error("No adjacency index links '{from}' and '{to}'")]
    MissingAdjacency { from: String, to: String },

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

pub type Result<T> = std::result::Result<T, LinkingError>;
