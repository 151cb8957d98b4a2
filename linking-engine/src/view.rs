//! FILENAME: linking-engine/src/view.rs
//! View Projection - Shapes handed to rendering collaborators.
//!
//! Every function here is pure: it reads a grouped result and the cascade
//! state and returns fresh rows, series and highlight flags. Nothing is
//! cached between views.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use dataset::logging::CAT_VIEW;
use dataset::{compare_terms, is_numeric, log_enter, log_exit, Row, Schema};
use rollup_engine::{aggregate, AggregationNode, GroupedResult, IdSet, NodeId};

use crate::cascade::{passes_external_filter, ActiveSelection, InteractionEvent, SelectionCascade};
use crate::definition::{AxisId, RowOrder, SortDirection, ViewDefinition, ViewId, ViewKind};
use crate::error::Result;

/// Opacity of chart cells and rows outside the active selection.
pub const LESSER_FILL_OPACITY: f64 = 0.375;
pub const FULL_OPACITY: f64 = 1.0;

/// Label written into the pinned bottom row.
pub const TOTAL_LABEL: &str = "Total";

/// Field name carrying the distinct count of `column` on a projected row.
pub fn distinct_field(column: &str) -> String {
    format!("distinct_{}", column)
}

// ============================================================================
// ROWS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Count(usize),
    Number(f64),
    Text(String),
    Absent,
}

impl FieldValue {
    fn from_segment(value: Option<&str>) -> Self {
        match value {
            Some(v) => FieldValue::Text(v.to_string()),
            None => FieldValue::Absent,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Count(c) => Some(*c as f64),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }
}

/// One node flattened into named fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub node_id: NodeId,

    /// The id this row stands for on its view's axis.
    pub key: Option<String>,

    pub fields: BTreeMap<String, FieldValue>,
}

impl TableRow {
    pub fn from_node(result: &GroupedResult, node: &AggregationNode, key_column: &str) -> Self {
        let definition = result.definition();
        let mut fields = BTreeMap::new();

        for (column, segment) in &node.group_path {
            fields.insert(column.clone(), FieldValue::from_segment(segment.as_deref()));
        }
        for column in &definition.sum_columns {
            fields.insert(column.clone(), FieldValue::Number(node.sum(column)));
        }
        for column in &definition.passthrough_columns {
            fields.insert(column.clone(), FieldValue::from_segment(node.passthrough_value(column)));
        }
        for column in definition.group_columns.iter().skip(node.depth()) {
            fields.insert(distinct_field(column), FieldValue::Count(node.distinct_count(column)));
        }

        TableRow {
            node_id: node.id,
            key: node.path_value(key_column).map(str::to_string),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_number)
    }
}

/// One row per node created for `level_column`, in creation order. The
/// level column doubles as the key column.
pub fn table_rows(result: &GroupedResult, level_column: &str) -> Vec<TableRow> {
    keyed_rows(result, level_column, level_column)
}

fn keyed_rows(result: &GroupedResult, level_column: &str, key_column: &str) -> Vec<TableRow> {
    result
        .nodes_at_level(level_column)
        .map(|node| TableRow::from_node(result, node, key_column))
        .collect()
}

/// The root's sums and distinct counts, labelled in `label_column`.
pub fn total_row(result: &GroupedResult, label_column: &str) -> TableRow {
    let mut row = TableRow::from_node(result, result.tree(), label_column);
    row.fields
        .insert(label_column.to_string(), FieldValue::Text(TOTAL_LABEL.to_string()));
    row
}

/// Rows for the ids selected on `axis`, grouped by id in selection order.
/// When rows sit below the axis level, every row under a selected id is
/// pinned, in row order.
pub fn pinned_active_rows(rows: &[TableRow], selection: &ActiveSelection, axis: &str) -> Vec<TableRow> {
    selection
        .values_on(axis)
        .iter()
        .flat_map(|value| {
            rows.iter()
                .filter(move |r| r.key.as_deref() == Some(value.as_str()))
        })
        .cloned()
        .collect()
}

// ============================================================================
// HIGHLIGHT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Highlight {
    Full,
    Dimmed,
}

impl Highlight {
    pub fn opacity(self) -> f64 {
        match self {
            Highlight::Full => FULL_OPACITY,
            Highlight::Dimmed => LESSER_FILL_OPACITY,
        }
    }
}

/// Dims an id that is outside the selection on its own axis, or outside
/// the id subset handed down from another axis.
pub fn highlight_for(selection: &ActiveSelection, axis: &str, subset: Option<&IdSet>, key: Option<&str>) -> Highlight {
    let unselected = selection.is_active_on(axis) && !key.is_some_and(|k| selection.contains(axis, k));
    let filtered_out = subset.is_some() && !key.is_some_and(|k| passes_external_filter(subset, k));
    if unselected || filtered_out {
        Highlight::Dimmed
    } else {
        Highlight::Full
    }
}

// ============================================================================
// COLUMNS AND ORDERING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    pub field: String,
    pub header_name: String,
    pub default_sort: Option<SortDirection>,
}

/// Descriptors for `fields`: declared columns first in declared order, the
/// rest after them in the order given.
pub fn column_descriptors<'a, I>(view: &ViewDefinition, fields: I) -> Vec<ColumnDescriptor>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut fields: Vec<&str> = fields.into_iter().collect();
    fields.sort_by_key(|f| view.column_position(f).unwrap_or(usize::MAX));
    fields
        .into_iter()
        .map(|field| ColumnDescriptor {
            field: field.to_string(),
            header_name: view.header_name(field),
            default_sort: view.default_sort(field),
        })
        .collect()
}

/// Compares two field values. Absent values sort after everything else;
/// numbers (and numeric text) before text; term labels chronologically
/// when `by_term` is set.
pub fn compare_field_values(a: &FieldValue, b: &FieldValue, by_term: bool) -> Ordering {
    use FieldValue::{Absent, Text};

    match (a, b) {
        (Absent, Absent) => Ordering::Equal,
        (Absent, _) => Ordering::Greater,
        (_, Absent) => Ordering::Less,
        (Text(x), Text(y)) if by_term => compare_terms(x, y),
        _ => match (sort_number(a), sort_number(b)) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.as_text().cmp(&b.as_text()),
        },
    }
}

fn sort_number(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Text(s) if is_numeric(s) => s.parse().ok(),
        other => other.as_number(),
    }
}

/// Stable sort of `rows` by one field. Rows missing the field go last in
/// both directions.
pub fn sort_rows(rows: &mut [TableRow], order: &RowOrder, term_column: Option<&str>) {
    let by_term = term_column == Some(order.field.as_str());
    let absent = FieldValue::Absent;
    rows.sort_by(|x, y| {
        let a = x.get(&order.field).unwrap_or(&absent);
        let b = y.get(&order.field).unwrap_or(&absent);
        let ordering = compare_field_values(a, b, by_term);
        if order.descending && !a.is_absent() && !b.is_absent() {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

/// The explicit order, or the first declared column with a default sort.
fn effective_order(view: &ViewDefinition) -> Option<RowOrder> {
    view.order_by.clone().or_else(|| {
        view.columns.iter().find_map(|c| {
            c.default_sort.map(|direction| RowOrder {
                field: c.field.clone(),
                descending: direction == SortDirection::Descending,
            })
        })
    })
}

// ============================================================================
// PROJECTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedRow {
    #[serde(flatten)]
    pub row: TableRow,
    pub highlight: Highlight,

    /// Result of the external-filter predicate for this row's key.
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableProjection {
    pub view_id: ViewId,
    pub axis: AxisId,
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<ProjectedRow>,
    pub pinned_top: Vec<TableRow>,
    pub pinned_bottom: Vec<TableRow>,
    pub scroll_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDatum {
    pub key: Option<String>,

    /// One value per series, in series order.
    pub values: Vec<f64>,
    pub highlight: Highlight,
    pub opacity: f64,

    /// The event a click on this datum sends back.
    pub on_click: Option<InteractionEvent>,
}

impl ChartDatum {
    /// The primary series' value.
    pub fn value(&self) -> f64 {
        self.values.first().copied().unwrap_or(0.0)
    }
}

/// One plotted measure. `field` is `None` for the row-count series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub field: Option<String>,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartProjection {
    pub view_id: ViewId,
    pub axis: AxisId,
    pub kind: ViewKind,
    pub series: Vec<ChartSeries>,
    pub data: Vec<ChartDatum>,
}

impl ChartProjection {
    /// Values of one series across the data, in datum order.
    pub fn series_values(&self, index: usize) -> Vec<f64> {
        self.data
            .iter()
            .map(|d| d.values.get(index).copied().unwrap_or(0.0))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewProjection {
    Table(TableProjection),
    Chart(ChartProjection),
}

impl ViewProjection {
    pub fn view_id(&self) -> &str {
        match self {
            ViewProjection::Table(t) => &t.view_id,
            ViewProjection::Chart(c) => &c.view_id,
        }
    }

    pub fn as_table(&self) -> Option<&TableProjection> {
        match self {
            ViewProjection::Table(t) => Some(t),
            ViewProjection::Chart(_) => None,
        }
    }

    pub fn as_chart(&self) -> Option<&ChartProjection> {
        match self {
            ViewProjection::Chart(c) => Some(c),
            ViewProjection::Table(_) => None,
        }
    }
}

/// Everything a projection reads besides its own definition.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionInput<'a> {
    pub schema: &'a Schema,

    /// Rows already narrowed by the term filter.
    pub rows: &'a [&'a Row],

    pub cascade: &'a SelectionCascade,

    /// External-filter subset for this view's axis.
    pub id_subset: Option<&'a IdSet>,

    pub term_column: Option<&'a str>,
}

/// Aggregates the rows visible to `view` and shapes them for its renderer.
pub fn project_view(view: &ViewDefinition, input: &ProjectionInput<'_>) -> Result<ViewProjection> {
    log_enter!(CAT_VIEW, "project_view", "view={}", view.id);

    let cascade = input.cascade;
    let axis_column = cascade.axis_column(&view.axis)?;
    let level = view.level_column(axis_column);

    let visible = cascade.visible_rows_for(&view.axis, input.schema, input.rows.iter().copied())?;
    let result = aggregate(input.schema, visible, &view.grouping);

    let mut rows = keyed_rows(&result, level, axis_column);
    if let Some(order) = effective_order(view) {
        sort_rows(&mut rows, &order, input.term_column);
    }

    let selection = cascade.selection();
    let subset = input.id_subset;
    let highlight = |row: &TableRow| highlight_for(selection, &view.axis, subset, row.key.as_deref());

    let projection = if view.kind.is_chart() {
        let data: Vec<ChartDatum> = rows
            .iter()
            .map(|row| {
                let values = if view.value_fields.is_empty() {
                    vec![result.subtree_row_count(row.node_id) as f64]
                } else {
                    view.value_fields
                        .iter()
                        .map(|field| row.number(field).unwrap_or(0.0))
                        .collect()
                };
                let shade = highlight(row);
                ChartDatum {
                    key: row.key.clone(),
                    values,
                    highlight: shade,
                    opacity: shade.opacity(),
                    on_click: row.key.as_ref().map(|k| InteractionEvent::new(view.axis.clone(), k.clone())),
                }
            })
            .collect();
        let fields: Vec<Option<String>> = if view.value_fields.is_empty() {
            vec![None]
        } else {
            view.value_fields.iter().cloned().map(Some).collect()
        };
        let series = fields
            .into_iter()
            .enumerate()
            .map(|(i, field)| ChartSeries {
                field,
                total: data.iter().filter_map(|d| d.values.get(i)).sum(),
            })
            .collect();
        ViewProjection::Chart(ChartProjection {
            view_id: view.id.clone(),
            axis: view.axis.clone(),
            kind: view.kind,
            series,
            data,
        })
    } else {
        let total = total_row(&result, level);
        let fields: BTreeSet<&str> = rows
            .iter()
            .chain(std::iter::once(&total))
            .flat_map(|r| r.fields.keys().map(String::as_str))
            .collect();
        let columns = column_descriptors(view, fields);
        let pinned_top = pinned_active_rows(&rows, selection, &view.axis);
        let projected = rows
            .into_iter()
            .map(|row| ProjectedRow {
                highlight: highlight(&row),
                visible: row
                    .key
                    .as_deref()
                    .map_or(subset.is_none(), |k| passes_external_filter(subset, k)),
                row,
            })
            .collect();
        ViewProjection::Table(TableProjection {
            view_id: view.id.clone(),
            axis: view.axis.clone(),
            columns,
            rows: projected,
            pinned_top,
            pinned_bottom: vec![total],
            scroll_to: cascade.scroll_target_for(&view.axis).map(str::to_string),
        })
    };

    log_exit!(CAT_VIEW, "project_view", "view={} nodes={}", view.id, result.len());
    Ok(projection)
}
