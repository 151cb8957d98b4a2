//! FILENAME: dataset/src/lib.rs
//! PURPOSE: Shared data types for the waiver dashboard crates.
//! CONTEXT: Rows, schema, numeric coercion and term handling. The rollup and
//! linking engines depend on this crate only for these shared types.

pub mod error;
pub mod load;
pub mod logging;
pub mod row;
pub mod term;
pub mod value;

// Re-exported so the logging macros resolve `$crate::log` in every caller.
pub use log;

pub use error::{DatasetError, Result};
pub use row::{Dataset, FieldIndex, Row, Schema};
pub use term::{compare_terms, quantify_term, TermFilter};
pub use value::{coerce_number, contribution, is_numeric};
