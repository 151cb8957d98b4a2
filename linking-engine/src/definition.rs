//! FILENAME: linking-engine/src/definition.rs
//! Dashboard Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE a linked dashboard.
//! These structures are designed to be:
//! - Serializable (loaded from JSON by the host)
//! - Immutable snapshots of which views exist and how they group data
//! - Free of field names hard-coded in the engines
//!
//! Reuses GroupingDefinition from rollup-engine.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use rollup_engine::GroupingDefinition;

use crate::error::{LinkingError, Result};

/// Identifier of a selectable dimension ("program", "student", ...).
pub type AxisId = String;

/// Identifier of one rendered view.
pub type ViewId = String;

// ============================================================================
// AXES
// ============================================================================

/// A dimension views can be selected and filtered by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisDefinition {
    pub id: AxisId,

    /// The dataset column holding this axis' ids.
    pub column: String,
}

impl AxisDefinition {
    pub fn new(id: impl Into<String>, column: impl Into<String>) -> Self {
        AxisDefinition {
            id: id.into(),
            column: column.into(),
        }
    }
}

// ============================================================================
// VIEWS
// ============================================================================

/// What kind of collaborator renders the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    #[default]
    Table,
    PieChart,
    BarChart,
}

impl ViewKind {
    pub fn is_chart(self) -> bool {
        !matches!(self, ViewKind::Table)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Display metadata for one projected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub field: String,

    /// Defaults to the field name.
    #[serde(default)]
    pub header_name: Option<String>,

    #[serde(default)]
    pub default_sort: Option<SortDirection>,
}

impl ColumnDefinition {
    pub fn new(field: impl Into<String>) -> Self {
        ColumnDefinition {
            field: field.into(),
            header_name: None,
            default_sort: None,
        }
    }

    pub fn header(mut self, header_name: impl Into<String>) -> Self {
        self.header_name = Some(header_name.into());
        self
    }

    pub fn sorted(mut self, direction: SortDirection) -> Self {
        self.default_sort = Some(direction);
        self
    }
}

/// Order applied to a view's rows before they are handed out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowOrder {
    pub field: String,
    #[serde(default)]
    pub descending: bool,
}

/// One rendered view: which axis it belongs to and how it rolls its rows up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDefinition {
    pub id: ViewId,

    /// Clicks in this view toggle this axis; rows are keyed by its column.
    pub axis: AxisId,

    #[serde(default)]
    pub kind: ViewKind,

    pub grouping: GroupingDefinition,

    /// Group column whose nodes become rows. Defaults to the axis column.
    #[serde(default)]
    pub level_column: Option<String>,

    /// Field order and headers. Fields not listed keep their name and go last.
    #[serde(default)]
    pub columns: Vec<ColumnDefinition>,

    #[serde(default)]
    pub order_by: Option<RowOrder>,

    /// Numeric fields a chart plots, one series each. The first is the
    /// primary series. Empty plots each node's row count.
    #[serde(default)]
    pub value_fields: Vec<String>,
}

impl ViewDefinition {
    pub fn new(id: impl Into<String>, axis: impl Into<String>, kind: ViewKind, grouping: GroupingDefinition) -> Self {
        ViewDefinition {
            id: id.into(),
            axis: axis.into(),
            kind,
            grouping,
            level_column: None,
            columns: Vec::new(),
            order_by: None,
            value_fields: Vec::new(),
        }
    }

    pub fn with_columns(mut self, columns: Vec<ColumnDefinition>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_order(mut self, field: impl Into<String>, descending: bool) -> Self {
        self.order_by = Some(RowOrder {
            field: field.into(),
            descending,
        });
        self
    }

    pub fn with_value_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.value_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// The group column whose nodes are this view's rows.
    pub fn level_column<'a>(&'a self, axis_column: &'a str) -> &'a str {
        self.level_column.as_deref().unwrap_or(axis_column)
    }

    pub fn column(&self, field: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.field == field)
    }

    pub fn header_name(&self, field: &str) -> String {
        self.column(field)
            .and_then(|c| c.header_name.clone())
            .unwrap_or_else(|| field.to_string())
    }

    pub fn default_sort(&self, field: &str) -> Option<SortDirection> {
        self.column(field).and_then(|c| c.default_sort)
    }

    /// Position of `field` in the declared column order.
    pub fn column_position(&self, field: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.field == field)
    }
}

// ============================================================================
// MAIN DEFINITION STRUCT
// ============================================================================

/// The complete definition of a linked dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardDefinition {
    pub axes: Vec<AxisDefinition>,

    pub views: Vec<ViewDefinition>,

    /// Column driving the dashboard-wide term filter and term ordering.
    #[serde(default)]
    pub term_column: Option<String>,
}

impl DashboardDefinition {
    /// Parses and validates a JSON definition.
    pub fn from_json(json: &str) -> Result<Self> {
        let definition: DashboardDefinition = serde_json::from_str(json)?;
        definition.validate()?;
        Ok(definition)
    }

    pub fn axis(&self, id: &str) -> Option<&AxisDefinition> {
        self.axes.iter().find(|a| a.id == id)
    }

    pub fn view(&self, id: &str) -> Option<&ViewDefinition> {
        self.views.iter().find(|v| v.id == id)
    }

    /// Checks ids are unique and every view points at a declared axis whose
    /// rows it actually groups by.
    pub fn validate(&self) -> Result<()> {
        let mut axis_ids = FxHashSet::default();
        for axis in &self.axes {
            if !axis_ids.insert(axis.id.as_str()) {
                return Err(LinkingError::DuplicateAxis(axis.id.clone()));
            }
        }

        let mut view_ids = FxHashSet::default();
        for view in &self.views {
            if !view_ids.insert(view.id.as_str()) {
                return Err(LinkingError::DuplicateView(view.id.clone()));
            }
            let axis = self
                .axis(&view.axis)
                .ok_or_else(|| LinkingError::UnknownAxis(view.axis.clone()))?;
            let level = view.level_column(&axis.column);
            if view.grouping.level_depth(level).is_none() {
                return Err(LinkingError::LevelNotGrouped {
                    view: view.id.clone(),
                    column: level.to_string(),
                });
            }
        }
        Ok(())
    }
}
