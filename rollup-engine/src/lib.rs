//! FILENAME: rollup-engine/src/lib.rs
//! Rollup subsystem for the waiver dashboard.
//!
//! This crate provides the hierarchical grouping engine as a standalone
//! module. It depends on `dataset` only for shared types (Row, Schema,
//! numeric coercion).
//!
//! Layers:
//! - `definition`: Serializable configuration (which columns to group/sum/carry)
//! - `tree`: The grouped output (arena of nodes, root first)
//! - `engine`: Single-pass aggregation (HOW we roll up)
//! - `adjacency`: Bidirectional id -> set(id) maps derived from two rollups

pub mod adjacency;
pub mod definition;
pub mod engine;
pub mod tree;

pub use adjacency::{build_adjacency, Adjacency, AdjacencyIndex, AdjacencyMap, Direction, IdSet};
pub use definition::GroupingDefinition;
pub use engine::{aggregate, Rollup};
pub use tree::{AggregationNode, GroupPath, GroupedResult, NodeId, Segment, ROOT};
