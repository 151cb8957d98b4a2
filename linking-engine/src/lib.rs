//! FILENAME: linking-engine/src/lib.rs
//! Linking Engine - Brushing and linking across dashboard views.
//!
//! This crate sits on top of rollup-engine:
//! - `definition`: serializable dashboard configuration (axes, views)
//! - `cascade`: the single active selection and the filters it implies
//! - `view`: pure projections into table rows and chart series
//! - `dashboard`: the stateful wrapper a host talks to

pub mod cascade;
pub mod dashboard;
pub mod definition;
pub mod error;
pub mod view;

pub use cascade::{passes_external_filter, ActiveSelection, InteractionEvent, SelectedValues, SelectionCascade};
pub use dashboard::Dashboard;
pub use definition::{
    AxisDefinition, AxisId, ColumnDefinition, DashboardDefinition, RowOrder, SortDirection, ViewDefinition, ViewId,
    ViewKind,
};
pub use error::{LinkingError, Result};
pub use view::{
    column_descriptors, compare_field_values, distinct_field, highlight_for, pinned_active_rows, project_view,
    sort_rows, table_rows, total_row, ChartDatum, ChartProjection, ChartSeries, ColumnDescriptor, FieldValue, Highlight,
    ProjectedRow, ProjectionInput, TableProjection, TableRow, ViewProjection, FULL_OPACITY, LESSER_FILL_OPACITY,
    TOTAL_LABEL,
};
