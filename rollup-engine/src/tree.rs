//! FILENAME: rollup-engine/src/tree.rs
//! Rollup Tree - The grouped output of one aggregation pass.
//!
//! Nodes live in an arena (`Vec<AggregationNode>`) and refer to each other by
//! `NodeId`. The arena order is the creation order, so it doubles as the flat
//! node list: root first, then every node in the order its first row arrived.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::definition::GroupingDefinition;

/// Position of a node in the arena.
pub type NodeId = usize;

/// The root is always the first node created.
pub const ROOT: NodeId = 0;

/// One level's group key. `None` is the absent segment, a group of its own.
pub type Segment = Option<String>;

/// (column, segment) pairs from the outermost level down to a node.
pub type GroupPath = SmallVec<[(String, Segment); 4]>;

// ============================================================================
// NODE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct AggregationNode {
    pub id: NodeId,

    /// `None` only for the root.
    pub parent: Option<NodeId>,

    /// The column this node was grouped by (`None` for the root).
    pub level: Option<String>,

    pub group_path: GroupPath,

    /// Running totals of the sum columns over every row under this node.
    pub sums: BTreeMap<String, f64>,

    /// Snapshot of the passthrough columns from the first row that created
    /// this node. Later rows never overwrite it.
    pub passthrough: BTreeMap<String, Option<String>>,

    /// For each deeper group column, how many nodes of that level exist
    /// below this one.
    pub distinct_counts: BTreeMap<String, usize>,

    pub children: FxHashMap<Segment, NodeId>,

    /// Rows whose group walk ended at this node.
    pub member_row_count: usize,
}

impl AggregationNode {
    pub(crate) fn root(definition: &GroupingDefinition) -> Self {
        AggregationNode {
            id: ROOT,
            parent: None,
            level: None,
            group_path: GroupPath::new(),
            sums: zeroed_sums(definition),
            passthrough: BTreeMap::new(),
            distinct_counts: BTreeMap::new(),
            children: FxHashMap::default(),
            member_row_count: 0,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.group_path.len()
    }

    /// This node's own group key. The root has none.
    pub fn segment(&self) -> Option<&Segment> {
        self.group_path.last().map(|(_, s)| s)
    }

    /// This node's key as text. Absent segments and the root give `None`.
    pub fn key(&self) -> Option<&str> {
        self.segment().and_then(|s| s.as_deref())
    }

    /// The value this node (or an ancestor) was grouped on for `column`.
    pub fn path_value(&self, column: &str) -> Option<&str> {
        self.group_path
            .iter()
            .find(|(c, _)| c == column)
            .and_then(|(_, s)| s.as_deref())
    }

    pub fn sum(&self, column: &str) -> f64 {
        self.sums.get(column).copied().unwrap_or(0.0)
    }

    pub fn distinct_count(&self, column: &str) -> usize {
        self.distinct_counts.get(column).copied().unwrap_or(0)
    }

    pub fn passthrough_value(&self, column: &str) -> Option<&str> {
        self.passthrough.get(column).and_then(|v| v.as_deref())
    }
}

pub(crate) fn zeroed_sums(definition: &GroupingDefinition) -> BTreeMap<String, f64> {
    definition
        .sum_columns
        .iter()
        .map(|c| (c.clone(), 0.0))
        .collect()
}

// ============================================================================
// GROUPED RESULT
// ============================================================================

/// The tree plus its flat node list, produced by [`crate::aggregate`].
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedResult {
    definition: GroupingDefinition,
    nodes: Vec<AggregationNode>,
}

impl GroupedResult {
    pub(crate) fn new(definition: GroupingDefinition, nodes: Vec<AggregationNode>) -> Self {
        debug_assert!(!nodes.is_empty(), "a grouped result always has a root");
        GroupedResult { definition, nodes }
    }

    pub fn definition(&self) -> &GroupingDefinition {
        &self.definition
    }

    /// The root node.
    pub fn tree(&self) -> &AggregationNode {
        &self.nodes[ROOT]
    }

    /// Every node, root first, in creation order.
    pub fn flat_nodes(&self) -> &[AggregationNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&AggregationNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when only the root exists.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Direct children of `id`, in creation order.
    pub fn children_of(&self, id: NodeId) -> Vec<&AggregationNode> {
        let Some(node) = self.nodes.get(id) else {
            return Vec::new();
        };
        let mut ids: Vec<NodeId> = node.children.values().copied().collect();
        ids.sort_unstable();
        ids.into_iter().filter_map(|c| self.nodes.get(c)).collect()
    }

    /// The child of `id` keyed by `segment`.
    pub fn child(&self, id: NodeId, segment: Option<&str>) -> Option<&AggregationNode> {
        let key: Segment = segment.map(str::to_string);
        let child = self.nodes.get(id)?.children.get(&key)?;
        self.nodes.get(*child)
    }

    /// Walks segments down from the root.
    pub fn find(&self, path: &[Option<&str>]) -> Option<&AggregationNode> {
        let mut current = self.tree();
        for segment in path {
            current = self.child(current.id, *segment)?;
        }
        Some(current)
    }

    /// Nodes created for `column`, in creation order.
    pub fn nodes_at_level<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a AggregationNode> + 'a {
        self.nodes
            .iter()
            .filter(move |n| n.level.as_deref() == Some(column))
    }

    /// Nodes at a given depth (0 = root), in creation order.
    pub fn nodes_at_depth(&self, depth: usize) -> impl Iterator<Item = &AggregationNode> + '_ {
        self.nodes.iter().filter(move |n| n.depth() == depth)
    }

    /// Rows that ended anywhere in the subtree of `id`.
    pub fn subtree_row_count(&self, id: NodeId) -> usize {
        let mut total = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(current) {
                total += node.member_row_count;
                stack.extend(node.children.values().copied());
            }
        }
        total
    }
}
