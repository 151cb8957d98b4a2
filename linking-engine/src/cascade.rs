//! FILENAME: linking-engine/src/cascade.rs
//! Selection Cascade - Brushing and linking across views.
//!
//! At most one axis holds a selection at a time. Views on other axes are
//! narrowed to rows that match it, while the selecting axis keeps every row
//! so the user can extend the selection. Views that narrow through an
//! external filter instead of re-aggregating get an id subset computed
//! through an adjacency index.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use dataset::logging::CAT_CASCADE;
use dataset::{log_debug, Row, Schema};
use rollup_engine::{AdjacencyIndex, IdSet};

use crate::definition::{AxisDefinition, AxisId};
use crate::error::{LinkingError, Result};

/// Selected ids, in the order they were picked.
pub type SelectedValues = SmallVec<[String; 4]>;

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ActiveSelection {
    #[default]
    Empty,
    Active {
        axis: AxisId,
        values: SelectedValues,
    },
}

impl ActiveSelection {
    pub fn is_empty(&self) -> bool {
        matches!(self, ActiveSelection::Empty)
    }

    pub fn axis(&self) -> Option<&str> {
        match self {
            ActiveSelection::Empty => None,
            ActiveSelection::Active { axis, .. } => Some(axis),
        }
    }

    /// Every selected id. Empty when nothing is selected.
    pub fn values(&self) -> &[String] {
        match self {
            ActiveSelection::Empty => &[],
            ActiveSelection::Active { values, .. } => values,
        }
    }

    pub fn is_active_on(&self, axis: &str) -> bool {
        self.axis() == Some(axis)
    }

    /// Selected ids on `axis`. Empty when the selection lives elsewhere.
    pub fn values_on(&self, axis: &str) -> &[String] {
        if self.is_active_on(axis) {
            self.values()
        } else {
            &[]
        }
    }

    pub fn contains(&self, axis: &str, value: &str) -> bool {
        self.values_on(axis).iter().any(|v| v == value)
    }
}

/// A click coming from a rendered view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub axis: AxisId,
    pub value: String,

    /// Clicks on pinned summary rows never change the selection.
    #[serde(default)]
    pub pinned: bool,
}

impl InteractionEvent {
    pub fn new(axis: impl Into<String>, value: impl Into<String>) -> Self {
        InteractionEvent {
            axis: axis.into(),
            value: value.into(),
            pinned: false,
        }
    }

    pub fn pinned(axis: impl Into<String>, value: impl Into<String>) -> Self {
        InteractionEvent {
            pinned: true,
            ..InteractionEvent::new(axis, value)
        }
    }
}

// ============================================================================
// CASCADE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionCascade {
    /// axis id -> dataset column
    axes: FxHashMap<AxisId, String>,
    selection: ActiveSelection,
}

impl SelectionCascade {
    /// Starts with nothing selected.
    pub fn new(axes: &[AxisDefinition]) -> Result<Self> {
        let mut map = FxHashMap::default();
        for axis in axes {
            if map.insert(axis.id.clone(), axis.column.clone()).is_some() {
                return Err(LinkingError::DuplicateAxis(axis.id.clone()));
            }
        }
        Ok(SelectionCascade {
            axes: map,
            selection: ActiveSelection::Empty,
        })
    }

    /// The dataset column behind `axis`.
    pub fn axis_column(&self, axis: &str) -> Result<&str> {
        self.axes
            .get(axis)
            .map(String::as_str)
            .ok_or_else(|| LinkingError::UnknownAxis(axis.to_string()))
    }

    pub fn selection(&self) -> &ActiveSelection {
        &self.selection
    }

    pub fn is_active_on(&self, axis: &str) -> bool {
        self.selection.is_active_on(axis)
    }

    /// Adds or removes `value` on `axis`. Selecting on another axis replaces
    /// the current selection; removing the last value clears it.
    pub fn toggle(&mut self, axis: &str, value: &str) -> Result<()> {
        self.axis_column(axis)?;

        let next = match std::mem::take(&mut self.selection) {
            ActiveSelection::Active {
                axis: current,
                mut values,
            } if current == axis => {
                if let Some(pos) = values.iter().position(|v| v == value) {
                    values.remove(pos);
                } else {
                    values.push(value.to_string());
                }
                if values.is_empty() {
                    ActiveSelection::Empty
                } else {
                    ActiveSelection::Active { axis: current, values }
                }
            }
            _ => ActiveSelection::Active {
                axis: axis.to_string(),
                values: SmallVec::from_elem(value.to_string(), 1),
            },
        };
        self.selection = next;

        log_debug!(
            CAT_CASCADE,
            "toggle axis={} value={} -> {:?}",
            axis,
            value,
            self.selection.values_on(axis)
        );
        Ok(())
    }

    /// Applies a click. Returns `false` when the event was ignored.
    pub fn handle(&mut self, event: &InteractionEvent) -> Result<bool> {
        if event.pinned {
            log_debug!(CAT_CASCADE, "ignored pinned click axis={}", event.axis);
            return Ok(false);
        }
        self.toggle(&event.axis, &event.value)?;
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.selection = ActiveSelection::Empty;
        log_debug!(CAT_CASCADE, "selection cleared");
    }

    /// The most recently selected id on `axis`, for views that scroll it
    /// into sight after their rows change.
    pub fn scroll_target_for(&self, axis: &str) -> Option<&str> {
        self.selection.values_on(axis).last().map(String::as_str)
    }

    /// Rows `view_axis` should aggregate. The selecting axis (and every axis
    /// while nothing is selected) sees all rows; other axes see only rows
    /// whose selecting-axis column holds a selected id.
    pub fn visible_rows_for<'a, I>(&self, view_axis: &str, schema: &Schema, rows: I) -> Result<Vec<&'a Row>>
    where
        I: IntoIterator<Item = &'a Row>,
    {
        self.axis_column(view_axis)?;

        let (axis, values) = match &self.selection {
            ActiveSelection::Active { axis, values } if axis != view_axis => (axis, values),
            _ => return Ok(rows.into_iter().collect()),
        };

        let field = schema.field_index(self.axis_column(axis)?);
        Ok(rows
            .into_iter()
            .filter(|row| row.value(field).is_some_and(|v| values.iter().any(|s| s == v)))
            .collect())
    }

    /// Ids of `target_axis` related to the current selection through one
    /// index. `None` means the target is unrestricted.
    pub fn id_subset_for(&self, target_axis: &str, adjacency: &AdjacencyIndex) -> Result<Option<IdSet>> {
        self.id_subset_through(target_axis, &[adjacency])
    }

    /// Like [`Self::id_subset_for`], hopping through a chain of indexes.
    /// Each hop starts from the column the previous one landed on and the
    /// last hop must land on the target axis' column.
    pub fn id_subset_through(&self, target_axis: &str, hops: &[&AdjacencyIndex]) -> Result<Option<IdSet>> {
        let target_column = self.axis_column(target_axis)?;

        let (axis, values) = match &self.selection {
            ActiveSelection::Active { axis, values } if axis != target_axis => (axis, values),
            _ => return Ok(None),
        };
        let from_column = self.axis_column(axis)?;

        let mut column = from_column;
        let mut ids: IdSet = values.iter().cloned().collect();
        for hop in hops {
            let direction = hop.direction_from(column).ok_or_else(|| mismatch(from_column, target_column, hop))?;
            ids = ids
                .iter()
                .flat_map(|id| hop.related(column, id))
                .map(str::to_string)
                .collect();
            column = hop.target_column(direction);
        }

        if column != target_column {
            return Err(match hops.last() {
                Some(hop) => mismatch(from_column, target_column, hop),
                None => LinkingError::MissingAdjacency {
                    from: from_column.to_string(),
                    to: target_column.to_string(),
                },
            });
        }

        log_debug!(
            CAT_CASCADE,
            "id subset {} -> {} hops={} ids={}",
            from_column,
            target_column,
            hops.len(),
            ids.len()
        );
        Ok(Some(ids))
    }
}

fn mismatch(from: &str, to: &str, index: &AdjacencyIndex) -> LinkingError {
    LinkingError::AdjacencyMismatch {
        from: from.to_string(),
        to: to.to_string(),
        index_a: index.a_column().to_string(),
        index_b: index.b_column().to_string(),
    }
}

/// The external-filter predicate: an unrestricted subset passes everything.
pub fn passes_external_filter(subset: Option<&IdSet>, id: &str) -> bool {
    subset.map_or(true, |ids| ids.contains(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataset::Dataset;
    use proptest::prelude::*;
    use rollup_engine::Adjacency;

    fn axes() -> Vec<AxisDefinition> {
        vec![
            AxisDefinition::new("program", "program"),
            AxisDefinition::new("student", "student"),
            AxisDefinition::new("waiver_type", "waiver_type"),
        ]
    }

    fn enrollments() -> Dataset {
        Dataset::from_records(vec![
            vec![("program", "CS"), ("student", "S1"), ("waiver_type", "Tuition")],
            vec![("program", "CS"), ("student", "S2"), ("waiver_type", "Fees")],
            vec![("program", "Math"), ("student", "S3"), ("waiver_type", "Tuition")],
            vec![("program", "Bio"), ("student", "S4"), ("waiver_type", "Housing")],
        ])
    }

    fn set(ids: &[&str]) -> IdSet {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_toggle_adds_and_removes() {
        let mut cascade = SelectionCascade::new(&axes()).unwrap();
        cascade.toggle("program", "CS").unwrap();
        cascade.toggle("program", "Math").unwrap();
        assert_eq!(cascade.selection().values(), ["CS", "Math"]);

        cascade.toggle("program", "CS").unwrap();
        assert_eq!(cascade.selection().values(), ["Math"]);

        cascade.toggle("program", "Math").unwrap();
        assert!(cascade.selection().is_empty());
    }

    #[test]
    fn test_double_toggle_returns_to_empty() {
        let mut cascade = SelectionCascade::new(&axes()).unwrap();
        cascade.toggle("student", "S1").unwrap();
        cascade.toggle("student", "S1").unwrap();
        assert_eq!(cascade.selection(), &ActiveSelection::Empty);
    }

    #[test]
    fn test_selecting_another_axis_replaces_selection() {
        let mut cascade = SelectionCascade::new(&axes()).unwrap();
        cascade.toggle("program", "CS").unwrap();
        cascade.toggle("program", "Math").unwrap();
        cascade.toggle("student", "S3").unwrap();

        assert!(cascade.is_active_on("student"));
        assert!(!cascade.is_active_on("program"));
        assert_eq!(cascade.selection().values(), ["S3"]);
        assert!(cascade.selection().values_on("program").is_empty());
    }

    #[test]
    fn test_unknown_axis_fails_without_changing_state() {
        let mut cascade = SelectionCascade::new(&axes()).unwrap();
        cascade.toggle("program", "CS").unwrap();

        let err = cascade.toggle("semester", "Fall 2023").unwrap_err();
        assert!(matches!(err, LinkingError::UnknownAxis(ref a) if a == "semester"));
        assert_eq!(cascade.selection().values(), ["CS"]);
    }

    #[test]
    fn test_duplicate_axis_rejected() {
        let result = SelectionCascade::new(&[
            AxisDefinition::new("program", "program"),
            AxisDefinition::new("program", "program_desc"),
        ]);
        assert!(matches!(result, Err(LinkingError::DuplicateAxis(_))));
    }

    #[test]
    fn test_pinned_clicks_are_ignored() {
        let mut cascade = SelectionCascade::new(&axes()).unwrap();
        assert!(!cascade.handle(&InteractionEvent::pinned("program", "Total")).unwrap());
        assert!(cascade.selection().is_empty());

        assert!(cascade.handle(&InteractionEvent::new("program", "CS")).unwrap());
        assert!(cascade.selection().contains("program", "CS"));
    }

    #[test]
    fn test_visible_rows_exempt_selecting_axis() {
        let ds = enrollments();
        let mut cascade = SelectionCascade::new(&axes()).unwrap();
        cascade.toggle("program", "CS").unwrap();

        let own = cascade.visible_rows_for("program", &ds.schema, &ds.rows).unwrap();
        assert_eq!(own.len(), 4);

        let other = cascade.visible_rows_for("student", &ds.schema, &ds.rows).unwrap();
        let students: Vec<_> = other.iter().filter_map(|r| ds.value(r, "student")).collect();
        assert_eq!(students, vec!["S1", "S2"]);
    }

    #[test]
    fn test_visible_rows_without_selection() {
        let ds = enrollments();
        let cascade = SelectionCascade::new(&axes()).unwrap();
        assert_eq!(cascade.visible_rows_for("student", &ds.schema, &ds.rows).unwrap().len(), 4);
        assert!(cascade.visible_rows_for("nope", &ds.schema, &ds.rows).is_err());
    }

    #[test]
    fn test_id_subset_for() {
        let ds = enrollments();
        let index = ds.adjacency("program", "student");
        let mut cascade = SelectionCascade::new(&axes()).unwrap();

        assert_eq!(cascade.id_subset_for("student", &index).unwrap(), None);

        cascade.toggle("program", "CS").unwrap();
        assert_eq!(cascade.id_subset_for("student", &index).unwrap(), Some(set(&["S1", "S2"])));
        // The selecting axis stays unrestricted.
        assert_eq!(cascade.id_subset_for("program", &index).unwrap(), None);

        cascade.toggle("program", "Math").unwrap();
        assert_eq!(
            cascade.id_subset_for("student", &index).unwrap(),
            Some(set(&["S1", "S2", "S3"]))
        );
        // Still exempt with several values active on the selecting axis.
        assert_eq!(cascade.id_subset_for("program", &index).unwrap(), None);
        assert_eq!(cascade.id_subset_through("program", &[&index]).unwrap(), None);
    }

    #[test]
    fn test_id_subset_reverse_direction() {
        let ds = enrollments();
        let index = ds.adjacency("program", "student");
        let mut cascade = SelectionCascade::new(&axes()).unwrap();
        cascade.toggle("student", "S3").unwrap();
        assert_eq!(cascade.id_subset_for("program", &index).unwrap(), Some(set(&["Math"])));
    }

    #[test]
    fn test_id_subset_with_unrelated_id_is_empty() {
        let ds = enrollments();
        let index = ds.adjacency("program", "student");
        let mut cascade = SelectionCascade::new(&axes()).unwrap();
        cascade.toggle("program", "Chemistry").unwrap();
        assert_eq!(cascade.id_subset_for("student", &index).unwrap(), Some(IdSet::default()));
    }

    #[test]
    fn test_id_subset_wrong_index_is_error() {
        let ds = enrollments();
        let index = ds.adjacency("student", "waiver_type");
        let mut cascade = SelectionCascade::new(&axes()).unwrap();
        cascade.toggle("program", "CS").unwrap();
        assert!(matches!(
            cascade.id_subset_for("student", &index),
            Err(LinkingError::AdjacencyMismatch { .. })
        ));
    }

    #[test]
    fn test_id_subset_through_two_hops() {
        let ds = enrollments();
        let program_student = ds.adjacency("program", "student");
        let student_waiver = ds.adjacency("student", "waiver_type");
        let mut cascade = SelectionCascade::new(&axes()).unwrap();
        cascade.toggle("program", "CS").unwrap();

        let subset = cascade
            .id_subset_through("waiver_type", &[&program_student, &student_waiver])
            .unwrap();
        assert_eq!(subset, Some(set(&["Tuition", "Fees"])));

        // Landing on the wrong column is a wiring error.
        assert!(cascade.id_subset_through("waiver_type", &[&program_student]).is_err());
        assert!(matches!(
            cascade.id_subset_through("waiver_type", &[]),
            Err(LinkingError::MissingAdjacency { .. })
        ));
    }

    #[test]
    fn test_passes_external_filter() {
        let subset = set(&["S1"]);
        assert!(passes_external_filter(None, "anything"));
        assert!(passes_external_filter(Some(&subset), "S1"));
        assert!(!passes_external_filter(Some(&subset), "S2"));
        assert!(!passes_external_filter(Some(&IdSet::default()), "S1"));
    }

    #[test]
    fn test_scroll_target() {
        let mut cascade = SelectionCascade::new(&axes()).unwrap();
        assert_eq!(cascade.scroll_target_for("student"), None);
        cascade.toggle("student", "S2").unwrap();
        cascade.toggle("student", "S1").unwrap();
        assert_eq!(cascade.scroll_target_for("student"), Some("S1"));
        assert_eq!(cascade.scroll_target_for("program"), None);
    }

    #[test]
    fn test_event_deserializes_without_pinned() {
        let event: InteractionEvent = serde_json::from_str(r#"{"axis": "program", "value": "CS"}"#).unwrap();
        assert_eq!(event, InteractionEvent::new("program", "CS"));
    }

    fn arb_toggles() -> impl Strategy<Value = Vec<(usize, u8)>> {
        prop::collection::vec((0usize..3, 0u8..4), 0..40)
    }

    proptest! {
        #[test]
        fn prop_selection_stays_on_one_axis(toggles in arb_toggles()) {
            let axes = axes();
            let mut cascade = SelectionCascade::new(&axes).unwrap();
            for (axis, value) in toggles {
                let axis = &axes[axis].id;
                let before = cascade.selection().clone();
                cascade.toggle(axis, &format!("v{}", value)).unwrap();

                let after = cascade.selection();
                let values = after.values();
                let mut unique: Vec<_> = values.to_vec();
                unique.sort();
                unique.dedup();
                prop_assert_eq!(unique.len(), values.len());
                prop_assert!(after.is_empty() || after.is_active_on(axis));
                prop_assert!(after.is_empty() == values.is_empty());

                // Toggling the same pair again undoes the change on the same axis.
                if before.is_empty() || before.is_active_on(axis) {
                    let mut undo = cascade.clone();
                    undo.toggle(axis, &format!("v{}", value)).unwrap();
                    let mut expected = before.values().to_vec();
                    let mut actual = undo.selection().values().to_vec();
                    expected.sort();
                    actual.sort();
                    prop_assert_eq!(actual, expected);
                }
            }
        }
    }

    #[test]
    fn test_clear() {
        let mut cascade = SelectionCascade::new(&axes()).unwrap();
        cascade.toggle("program", "CS").unwrap();
        cascade.clear();
        assert!(cascade.selection().is_empty());
    }
}
