//! FILENAME: dataset/src/term.rs
//! PURPOSE: Academic term ordering and the dashboard-wide term filter.
//! CONTEXT: Terms arrive as text like "Fall 2023". `quantify_term` maps them to
//! a sortable number (year followed by the season index). The `TermFilter`
//! narrows the rows every view sees, before any cross-view selection applies.

use rustc_hash::FxHashSet;

use crate::logging::CAT_LOAD;
use crate::log_debug;
use crate::row::{Dataset, Row, Schema};

/// Seasons in chronological order within a year.
const SEASONS: [&str; 3] = ["spring", "summer", "fall"];

/// "Spring 2023" -> 20230, "Summer 2023" -> 20231, "Fall 2023" -> 20232.
/// Returns `None` for anything not shaped `<season> <year>`.
pub fn quantify_term(term: &str) -> Option<u32> {
    let mut parts = term.split_whitespace();
    let season = parts.next()?.to_ascii_lowercase();
    let year = parts.next()?;
    if parts.next().is_some() || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let season_idx = SEASONS.iter().position(|s| *s == season)? as u32;
    let year: u32 = year.parse().ok()?;
    year.checked_mul(10)?.checked_add(season_idx)
}

/// Chronological comparison. Unrecognized terms sort last, by text.
pub fn compare_terms(a: &str, b: &str) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (quantify_term(a), quantify_term(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

// ============================================================================
// TERM FILTER
// ============================================================================

/// Which terms are currently included. Starts with every term active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermFilter {
    column: String,
    terms: Vec<String>,
    active: FxHashSet<String>,
}

impl TermFilter {
    /// Collects every term in `column` and activates all of them.
    pub fn from_dataset(dataset: &Dataset, column: &str) -> Self {
        let mut terms = dataset.distinct_values(column);
        terms.sort_by(|a, b| compare_terms(a, b));
        let active = terms.iter().cloned().collect();
        log_debug!(CAT_LOAD, "term filter column={} terms={}", column, terms.len());
        TermFilter {
            column: column.to_string(),
            terms,
            active,
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Every known term, chronologically.
    pub fn terms_sorted(&self) -> &[String] {
        &self.terms
    }

    pub fn is_active(&self, term: &str) -> bool {
        self.active.contains(term)
    }

    /// Flips one term. Returns whether it is active afterwards.
    pub fn toggle(&mut self, term: &str) -> bool {
        if self.active.remove(term) {
            false
        } else {
            self.active.insert(term.to_string());
            true
        }
    }

    /// True when every known term is active.
    pub fn is_unrestricted(&self) -> bool {
        self.terms.iter().all(|t| self.active.contains(t))
    }

    /// Rows whose term is active. Rows without a term always pass.
    pub fn apply<'a, I>(&self, schema: &Schema, rows: I) -> Vec<&'a Row>
    where
        I: IntoIterator<Item = &'a Row>,
    {
        let field = schema.field_index(&self.column);
        rows.into_iter()
            .filter(|row| match row.value(field) {
                Some(term) => self.active.contains(term),
                None => true,
            })
            .collect()
    }
}
