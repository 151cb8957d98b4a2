//! FILENAME: linking-engine/src/dashboard.rs
//! PURPOSE: Owns one loaded dataset plus the cascade and wires them to views.
//! CONTEXT: The host feeds clicks in through `handle` and pulls view props out
//! through `project`. Everything runs synchronously on the caller's thread.

use dataset::logging::{CAT_ADJ, CAT_LOAD};
use dataset::{log_debug, log_info, Dataset, Row, TermFilter};
use rollup_engine::{build_adjacency, AdjacencyIndex, IdSet};

use crate::cascade::{ActiveSelection, InteractionEvent, SelectionCascade};
use crate::definition::{DashboardDefinition, ViewDefinition};
use crate::error::{LinkingError, Result};
use crate::view::{project_view, ProjectionInput, ViewProjection};

#[derive(Debug)]
pub struct Dashboard {
    definition: DashboardDefinition,
    dataset: Dataset,
    term_filter: Option<TermFilter>,
    cascade: SelectionCascade,

    /// One index per pair of distinct axis columns, over term-filtered rows.
    adjacency: Vec<AdjacencyIndex>,
}

impl Dashboard {
    /// Validates `definition` and builds the term filter and adjacency
    /// indexes for `dataset`. Nothing is selected afterwards.
    pub fn load(definition: DashboardDefinition, dataset: Dataset) -> Result<Self> {
        definition.validate()?;
        let cascade = SelectionCascade::new(&definition.axes)?;
        let term_filter = term_filter_for(&definition, &dataset);
        let adjacency = build_indexes(&definition, &dataset, term_filter.as_ref());

        log_info!(
            CAT_LOAD,
            "dashboard loaded: rows={} axes={} views={}",
            dataset.len(),
            definition.axes.len(),
            definition.views.len()
        );

        Ok(Dashboard {
            definition,
            dataset,
            term_filter,
            cascade,
            adjacency,
        })
    }

    /// Parses both the definition and the records from JSON.
    pub fn from_json(definition_json: &str, records_json: &str) -> Result<Self> {
        let definition = DashboardDefinition::from_json(definition_json)?;
        let dataset = Dataset::from_json(records_json)?;
        Dashboard::load(definition, dataset)
    }

    /// Swaps in a new dataset. The selection resets and every term becomes
    /// active again.
    pub fn reload(&mut self, dataset: Dataset) {
        self.term_filter = term_filter_for(&self.definition, &dataset);
        self.adjacency = build_indexes(&self.definition, &dataset, self.term_filter.as_ref());
        self.dataset = dataset;
        self.cascade.clear();
        log_info!(CAT_LOAD, "dashboard reloaded: rows={}", self.dataset.len());
    }

    pub fn definition(&self) -> &DashboardDefinition {
        &self.definition
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn cascade(&self) -> &SelectionCascade {
        &self.cascade
    }

    pub fn selection(&self) -> &ActiveSelection {
        self.cascade.selection()
    }

    // ------------------------------------------------------------------------
    // Interaction
    // ------------------------------------------------------------------------

    /// Applies a click from any view. Returns `false` when it was ignored.
    pub fn handle(&mut self, event: &InteractionEvent) -> Result<bool> {
        self.cascade.handle(event)
    }

    pub fn toggle(&mut self, axis: &str, value: &str) -> Result<()> {
        self.cascade.toggle(axis, value)
    }

    pub fn clear_selection(&mut self) {
        self.cascade.clear();
    }

    // ------------------------------------------------------------------------
    // Terms
    // ------------------------------------------------------------------------

    /// Every known term, chronologically. Empty without a term column.
    pub fn terms(&self) -> &[String] {
        match &self.term_filter {
            Some(filter) => filter.terms_sorted(),
            None => &[],
        }
    }

    pub fn is_term_active(&self, term: &str) -> bool {
        self.term_filter.as_ref().is_some_and(|f| f.is_active(term))
    }

    /// Flips one term and rebuilds the indexes. Returns whether the term is
    /// active afterwards, or `None` when the dashboard has no term column.
    pub fn toggle_term(&mut self, term: &str) -> Option<bool> {
        let active = self.term_filter.as_mut()?.toggle(term);
        self.adjacency = build_indexes(&self.definition, &self.dataset, self.term_filter.as_ref());
        log_debug!(CAT_LOAD, "term {} active={}", term, active);
        Some(active)
    }

    /// Rows that survive the term filter.
    pub fn active_rows(&self) -> Vec<&Row> {
        filtered_rows(&self.dataset, self.term_filter.as_ref())
    }

    // ------------------------------------------------------------------------
    // Lookups and projections
    // ------------------------------------------------------------------------

    /// The index linking two columns, in either order.
    pub fn adjacency_between(&self, x: &str, y: &str) -> Option<&AdjacencyIndex> {
        self.adjacency.iter().find(|index| index.connects(x, y))
    }

    /// External-filter subset for `axis`. `None` when unrestricted.
    pub fn id_subset_for(&self, axis: &str) -> Result<Option<IdSet>> {
        let target = self.cascade.axis_column(axis)?;
        let from = match self.cascade.selection().axis() {
            Some(selected) if selected != axis => self.cascade.axis_column(selected)?,
            _ => return Ok(None),
        };
        if from == target {
            return self.cascade.id_subset_through(axis, &[]);
        }
        let index = self
            .adjacency_between(from, target)
            .ok_or_else(|| LinkingError::MissingAdjacency {
                from: from.to_string(),
                to: target.to_string(),
            })?;
        self.cascade.id_subset_for(axis, index)
    }

    pub fn project(&self, view_id: &str) -> Result<ViewProjection> {
        let view = self
            .definition
            .view(view_id)
            .ok_or_else(|| LinkingError::UnknownView(view_id.to_string()))?;
        self.project_definition(view)
    }

    /// Every view, in declared order.
    pub fn project_all(&self) -> Result<Vec<ViewProjection>> {
        self.definition
            .views
            .iter()
            .map(|view| self.project_definition(view))
            .collect()
    }

    fn project_definition(&self, view: &ViewDefinition) -> Result<ViewProjection> {
        let rows = self.active_rows();
        let subset = self.id_subset_for(&view.axis)?;
        let input = ProjectionInput {
            schema: &self.dataset.schema,
            rows: &rows,
            cascade: &self.cascade,
            id_subset: subset.as_ref(),
            term_column: self.definition.term_column.as_deref(),
        };
        project_view(view, &input)
    }
}

fn term_filter_for(definition: &DashboardDefinition, dataset: &Dataset) -> Option<TermFilter> {
    definition
        .term_column
        .as_deref()
        .map(|column| TermFilter::from_dataset(dataset, column))
}

fn filtered_rows<'a>(dataset: &'a Dataset, term_filter: Option<&TermFilter>) -> Vec<&'a Row> {
    match term_filter {
        Some(filter) => filter.apply(&dataset.schema, &dataset.rows),
        None => dataset.rows.iter().collect(),
    }
}

fn build_indexes(
    definition: &DashboardDefinition,
    dataset: &Dataset,
    term_filter: Option<&TermFilter>,
) -> Vec<AdjacencyIndex> {
    let rows = filtered_rows(dataset, term_filter);

    let mut columns: Vec<&str> = Vec::new();
    for axis in &definition.axes {
        if !columns.contains(&axis.column.as_str()) {
            columns.push(&axis.column);
        }
    }

    let mut indexes = Vec::new();
    for (i, a) in columns.iter().enumerate() {
        for b in &columns[i + 1..] {
            indexes.push(build_adjacency(&dataset.schema, rows.iter().copied(), a, b));
        }
    }
    log_debug!(CAT_ADJ, "built {} adjacency indexes over {} rows", indexes.len(), rows.len());
    indexes
}
