//! FILENAME: rollup-engine/src/engine.rs
//! Rollup Engine - Turns flat rows into a grouped tree in a single pass.
//!
//! Algorithm (per row, in input order):
//! 1. Add the row's numeric sum fields to the root
//! 2. Walk the group columns, descending one level per column
//! 3. Create a missing child (zeroed sums, first-wins passthrough) and bump
//!    `distinct_counts[column]` on every ancestor visited so far
//! 4. Add the row's numeric sum fields to the child and continue
//! 5. Count the row as a member of the node the walk ended on

use smallvec::{smallvec, SmallVec};

use dataset::logging::CAT_ROLLUP;
use dataset::{coerce_number, log_enter, log_exit, Dataset, FieldIndex, Row, Schema};

use crate::definition::GroupingDefinition;
use crate::tree::{zeroed_sums, AggregationNode, GroupPath, GroupedResult, NodeId, Segment, ROOT};

/// A column name resolved against the schema. Unknown columns resolve to
/// `None` and read as absent on every row.
struct ResolvedColumn<'d> {
    name: &'d str,
    field: Option<FieldIndex>,
}

fn resolve<'d>(schema: &Schema, columns: &'d [String]) -> Vec<ResolvedColumn<'d>> {
    columns
        .iter()
        .map(|name| ResolvedColumn {
            name,
            field: schema.field_index(name),
        })
        .collect()
}

// ============================================================================
// TREE BUILDER
// ============================================================================

struct TreeBuilder<'d> {
    definition: &'d GroupingDefinition,
    group_columns: Vec<ResolvedColumn<'d>>,
    sum_columns: Vec<ResolvedColumn<'d>>,
    passthrough_columns: Vec<ResolvedColumn<'d>>,
    nodes: Vec<AggregationNode>,
}

impl<'d> TreeBuilder<'d> {
    fn new(schema: &Schema, definition: &'d GroupingDefinition) -> Self {
        TreeBuilder {
            definition,
            group_columns: resolve(schema, &definition.group_columns),
            sum_columns: resolve(schema, &definition.sum_columns),
            passthrough_columns: resolve(schema, &definition.passthrough_columns),
            nodes: vec![AggregationNode::root(definition)],
        }
    }

    /// The numeric fields of one row. Non-numeric and absent fields are skipped.
    fn contributions(&self, row: &Row) -> SmallVec<[(&'d str, f64); 4]> {
        self.sum_columns
            .iter()
            .filter_map(|c| coerce_number(row.value(c.field)).map(|n| (c.name, n)))
            .collect()
    }

    fn add_sums(&mut self, id: NodeId, contributions: &[(&str, f64)]) {
        let node = &mut self.nodes[id];
        for (column, n) in contributions {
            if let Some(total) = node.sums.get_mut(*column) {
                *total += n;
            }
        }
    }

    fn create_child(&mut self, parent: NodeId, column: &str, segment: Segment, row: &Row) -> NodeId {
        let id = self.nodes.len();

        let mut group_path: GroupPath = self.nodes[parent].group_path.clone();
        group_path.push((column.to_string(), segment.clone()));

        let passthrough = self
            .passthrough_columns
            .iter()
            .map(|c| (c.name.to_string(), row.value(c.field).map(str::to_string)))
            .collect();

        self.nodes.push(AggregationNode {
            id,
            parent: Some(parent),
            level: Some(column.to_string()),
            group_path,
            sums: zeroed_sums(self.definition),
            passthrough,
            distinct_counts: Default::default(),
            children: Default::default(),
            member_row_count: 0,
        });
        self.nodes[parent].children.insert(segment, id);
        id
    }

    fn add_row(&mut self, row: &Row) {
        let contributions = self.contributions(row);
        self.add_sums(ROOT, &contributions);

        let mut current = ROOT;
        let mut ancestors: SmallVec<[NodeId; 4]> = smallvec![ROOT];

        for level in 0..self.group_columns.len() {
            let column = self.group_columns[level].name;
            let segment: Segment = row.value(self.group_columns[level].field).map(str::to_string);

            let existing = self.nodes[current].children.get(&segment).copied();
            let next = match existing {
                Some(id) => id,
                None => {
                    let id = self.create_child(current, column, segment, row);
                    for &ancestor in &ancestors {
                        *self.nodes[ancestor]
                            .distinct_counts
                            .entry(column.to_string())
                            .or_insert(0) += 1;
                    }
                    id
                }
            };

            self.add_sums(next, &contributions);
            ancestors.push(next);
            current = next;
        }

        self.nodes[current].member_row_count += 1;
    }

    fn finish(self) -> GroupedResult {
        GroupedResult::new(self.definition.clone(), self.nodes)
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Groups `rows` by the definition's columns, accumulating sums and
/// distinct counts. An empty input yields a root-only result.
pub fn aggregate<'a, I>(schema: &Schema, rows: I, definition: &GroupingDefinition) -> GroupedResult
where
    I: IntoIterator<Item = &'a Row>,
{
    log_enter!(
        CAT_ROLLUP,
        "aggregate",
        "groups={:?} sums={:?}",
        definition.group_columns,
        definition.sum_columns
    );

    let mut builder = TreeBuilder::new(schema, definition);
    let mut row_count = 0usize;
    for row in rows {
        builder.add_row(row);
        row_count += 1;
    }
    let result = builder.finish();

    log_exit!(CAT_ROLLUP, "aggregate", "rows={} nodes={}", row_count, result.len());
    result
}

/// Rollup operations on a loaded dataset.
pub trait Rollup {
    fn aggregate(&self, definition: &GroupingDefinition) -> GroupedResult;
}

impl Rollup for Dataset {
    fn aggregate(&self, definition: &GroupingDefinition) -> GroupedResult {
        aggregate(&self.schema, &self.rows, definition)
    }
}
