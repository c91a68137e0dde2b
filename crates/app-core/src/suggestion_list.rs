//! Rendered rows of the location suggestion list
//!
//! The list always ends with an "add new dive site" row so the user can
//! create a place that search did not find.

use crate::places::PlaceCandidate;

/// List identity of the trailing "add new" row
pub const SENTINEL_KEY: &str = "add_new_dive_site";

/// Title of the trailing "add new" row
pub const SENTINEL_TITLE: &str = "Add new dive site";

/// Subtitle of the trailing "add new" row
pub const SENTINEL_SUBTITLE: &str = "Share a new spot with the community";

/// One row of the suggestion list
#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionRow {
    /// A search result
    Place(PlaceCandidate),
    /// The trailing "add new dive site" affordance
    AddNew,
}

impl SuggestionRow {
    /// Stable identity for list diffing
    pub fn key(&self) -> &str {
        match self {
            SuggestionRow::Place(candidate) => &candidate.key,
            SuggestionRow::AddNew => SENTINEL_KEY,
        }
    }

    /// Main label
    pub fn title(&self) -> &str {
        match self {
            SuggestionRow::Place(candidate) => &candidate.primary_text,
            SuggestionRow::AddNew => SENTINEL_TITLE,
        }
    }

    /// Secondary label
    pub fn subtitle(&self) -> &str {
        match self {
            SuggestionRow::Place(candidate) => &candidate.secondary_text,
            SuggestionRow::AddNew => SENTINEL_SUBTITLE,
        }
    }

    /// Whether this is the "add new" row
    pub fn is_sentinel(&self) -> bool {
        matches!(self, SuggestionRow::AddNew)
    }
}

/// Render suggestions followed by exactly one sentinel row
pub fn render_rows(suggestions: &[PlaceCandidate]) -> Vec<SuggestionRow> {
    suggestions
        .iter()
        .cloned()
        .map(SuggestionRow::Place)
        .chain(std::iter::once(SuggestionRow::AddNew))
        .collect()
}
