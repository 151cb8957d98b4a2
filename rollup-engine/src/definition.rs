//! FILENAME: rollup-engine/src/definition.rs
//! Grouping Definition - The serializable configuration of one rollup.
//!
//! A definition names columns only. The engine resolves them against the
//! dataset's schema at aggregation time and hard-codes none of them.

use serde::{Deserialize, Serialize};

/// Which columns to group by, sum, and carry along for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingDefinition {
    /// Group-by columns, ordered from the outermost level to the innermost.
    pub group_columns: Vec<String>,

    /// Columns whose numeric values are summed on every node.
    #[serde(default)]
    pub sum_columns: Vec<String>,

    /// Columns copied onto a node from the first row that created it.
    #[serde(default)]
    pub passthrough_columns: Vec<String>,
}

impl GroupingDefinition {
    pub fn new<I, S>(group_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        GroupingDefinition {
            group_columns: group_columns.into_iter().map(Into::into).collect(),
            sum_columns: Vec::new(),
            passthrough_columns: Vec::new(),
        }
    }

    pub fn with_sums<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sum_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_passthrough<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.passthrough_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Number of tree levels below the root.
    pub fn depth(&self) -> usize {
        self.group_columns.len()
    }

    /// Depth (1-based) at which `column` is grouped, if it is a group column.
    pub fn level_depth(&self, column: &str) -> Option<usize> {
        self.group_columns.iter().position(|c| c == column).map(|i| i + 1)
    }
}
