//! FILENAME: rollup-engine/src/adjacency.rs
//! Adjacency Index - Bidirectional "who belongs with whom" lookups.
//!
//! Built from two rollups: `[a, b]` gives a -> {b}, `[b, a]` gives b -> {a}.
//! Pairs where either side is absent or empty are left out, so an id with no
//! counterpart never gets a key. Lookups treat a missing key and an empty set
//! the same way.

use rustc_hash::{FxHashMap, FxHashSet};

use dataset::logging::CAT_ADJ;
use dataset::{log_enter, log_exit, Dataset, Row, Schema};

use crate::definition::GroupingDefinition;
use crate::engine::aggregate;
use crate::tree::{GroupedResult, ROOT};

pub type IdSet = FxHashSet<String>;
pub type AdjacencyMap = FxHashMap<String, IdSet>;

/// Which way a lookup runs through the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    AToB,
    BToA,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacencyIndex {
    a_column: String,
    b_column: String,
    a_to_b: AdjacencyMap,
    b_to_a: AdjacencyMap,
}

impl AdjacencyIndex {
    /// Assembles an index from prebuilt maps.
    pub fn from_maps(
        a_column: impl Into<String>,
        b_column: impl Into<String>,
        a_to_b: AdjacencyMap,
        b_to_a: AdjacencyMap,
    ) -> Self {
        AdjacencyIndex {
            a_column: a_column.into(),
            b_column: b_column.into(),
            a_to_b,
            b_to_a,
        }
    }

    /// Builds both directions from explicit (a, b) pairs.
    pub fn from_pairs<I, A, B>(a_column: impl Into<String>, b_column: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        let mut a_to_b = AdjacencyMap::default();
        let mut b_to_a = AdjacencyMap::default();
        for (a, b) in pairs {
            let (a, b) = (a.into(), b.into());
            if a.is_empty() || b.is_empty() {
                continue;
            }
            a_to_b.entry(a.clone()).or_default().insert(b.clone());
            b_to_a.entry(b).or_default().insert(a);
        }
        AdjacencyIndex::from_maps(a_column, b_column, a_to_b, b_to_a)
    }

    pub fn a_column(&self) -> &str {
        &self.a_column
    }

    pub fn b_column(&self) -> &str {
        &self.b_column
    }

    pub fn a_to_b(&self) -> &AdjacencyMap {
        &self.a_to_b
    }

    pub fn b_to_a(&self) -> &AdjacencyMap {
        &self.b_to_a
    }

    /// The direction that starts at `from_column`, if the index covers it.
    pub fn direction_from(&self, from_column: &str) -> Option<Direction> {
        if from_column == self.a_column {
            Some(Direction::AToB)
        } else if from_column == self.b_column {
            Some(Direction::BToA)
        } else {
            None
        }
    }

    /// True when this index links the two columns, in either order.
    pub fn connects(&self, x: &str, y: &str) -> bool {
        (x == self.a_column && y == self.b_column) || (x == self.b_column && y == self.a_column)
    }

    /// The column a lookup in `direction` lands on.
    pub fn target_column(&self, direction: Direction) -> &str {
        match direction {
            Direction::AToB => &self.b_column,
            Direction::BToA => &self.a_column,
        }
    }

    pub fn lookup(&self, direction: Direction, id: &str) -> Option<&IdSet> {
        match direction {
            Direction::AToB => self.a_to_b.get(id),
            Direction::BToA => self.b_to_a.get(id),
        }
    }

    /// Ids related to `id` when read from `from_column`. Empty when the id has
    /// no entry, has an empty entry, or the column is not covered.
    pub fn related<'s>(&'s self, from_column: &str, id: &str) -> impl Iterator<Item = &'s str> + 's {
        self.direction_from(from_column)
            .and_then(|d| self.lookup(d, id))
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn contains_pair(&self, a: &str, b: &str) -> bool {
        self.a_to_b.get(a).is_some_and(|set| set.contains(b))
    }
}

/// Collapses each level-1 node's level-2 keys into a set.
fn collapse(result: &GroupedResult) -> AdjacencyMap {
    let mut map = AdjacencyMap::default();
    for outer in result.children_of(ROOT) {
        let Some(outer_key) = outer.key().filter(|k| !k.is_empty()) else {
            continue;
        };
        let inner: IdSet = result
            .children_of(outer.id)
            .into_iter()
            .filter_map(|n| n.key())
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
        if !inner.is_empty() {
            map.insert(outer_key.to_string(), inner);
        }
    }
    map
}

/// Builds the a <-> b index over `rows`.
pub fn build_adjacency<'a, I>(schema: &Schema, rows: I, a_column: &str, b_column: &str) -> AdjacencyIndex
where
    I: IntoIterator<Item = &'a Row> + Clone,
{
    log_enter!(CAT_ADJ, "build_adjacency", "a={} b={}", a_column, b_column);

    let forward = aggregate(schema, rows.clone(), &GroupingDefinition::new([a_column, b_column]));
    let backward = aggregate(schema, rows, &GroupingDefinition::new([b_column, a_column]));
    let index = AdjacencyIndex::from_maps(a_column, b_column, collapse(&forward), collapse(&backward));

    log_exit!(
        CAT_ADJ,
        "build_adjacency",
        "a_ids={} b_ids={}",
        index.a_to_b.len(),
        index.b_to_a.len()
    );
    index
}

/// Adjacency operations on a loaded dataset.
pub trait Adjacency {
    fn adjacency(&self, a_column: &str, b_column: &str) -> AdjacencyIndex;
}

impl Adjacency for Dataset {
    fn adjacency(&self, a_column: &str, b_column: &str) -> AdjacencyIndex {
        build_adjacency(&self.schema, &self.rows, a_column, b_column)
    }
}
