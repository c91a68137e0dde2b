//! Offline dive site index
//!
//! When the device has no connection, typeahead lookups run against a local
//! copy of the dive site dataset. Matching is accent- and case-insensitive:
//! every query word must appear in the site name or its city label, and
//! name matches outrank city matches.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;

use crate::places::{normalize_candidates, PlaceCandidate};
use crate::providers::OfflineSearchIndex;

/// Default cap on offline results
pub const DEFAULT_OFFLINE_LIMIT: usize = 10;

/// Errors while loading the offline dataset
#[derive(Debug, Error)]
pub enum OfflineIndexError {
    /// Dataset file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Dataset is not a JSON array of place candidates
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for offline index operations
pub type Result<T> = std::result::Result<T, OfflineIndexError>;

/// Fold a string to lowercase ASCII for matching
///
/// `"Île Ronde"` and `"ile ronde"` fold to the same key.
pub fn fold_key(s: &str) -> String {
    deunicode::deunicode(s).to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchRank {
    Exact,
    Prefix,
    WordPrefix,
    Substring,
    ScatteredInName,
    CityLabel,
}

#[derive(Debug, Clone)]
struct IndexedPlace {
    candidate: PlaceCandidate,
    name_key: String,
    city_key: String,
}

impl IndexedPlace {
    fn new(candidate: PlaceCandidate) -> Self {
        Self {
            name_key: fold_key(&candidate.primary_text),
            city_key: fold_key(&candidate.secondary_text),
            candidate,
        }
    }

    fn rank(&self, phrase: &str, tokens: &[&str]) -> Option<MatchRank> {
        let all_in_name = tokens.iter().all(|t| self.name_key.contains(t));
        if !all_in_name
            && !tokens
                .iter()
                .all(|t| self.name_key.contains(t) || self.city_key.contains(t))
        {
            return None;
        }

        let rank = if self.name_key == phrase {
            MatchRank::Exact
        } else if self.name_key.starts_with(phrase) {
            MatchRank::Prefix
        } else if self
            .name_key
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word.starts_with(phrase))
        {
            MatchRank::WordPrefix
        } else if self.name_key.contains(phrase) {
            MatchRank::Substring
        } else if all_in_name {
            MatchRank::ScatteredInName
        } else {
            MatchRank::CityLabel
        };

        Some(rank)
    }
}

/// In-memory dive site index for offline typeahead
#[derive(Debug, Clone)]
pub struct OfflinePlaceIndex {
    places: Vec<IndexedPlace>,
    limit: usize,
}

impl OfflinePlaceIndex {
    /// Build an index over a set of places
    pub fn new(places: Vec<PlaceCandidate>) -> Self {
        Self {
            places: normalize_candidates(places)
                .into_iter()
                .map(IndexedPlace::new)
                .collect(),
            limit: DEFAULT_OFFLINE_LIMIT,
        }
    }

    /// Set the maximum number of results per lookup
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Load an index from a JSON array of place candidates
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let places: Vec<PlaceCandidate> = serde_json::from_reader(reader)?;
        Ok(Self::new(places))
    }

    /// Load an index from a JSON dataset file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let index = Self::from_reader(BufReader::new(file))?;
        tracing::info!(path = %path.display(), places = index.len(), "loaded offline place index");
        Ok(index)
    }

    /// Number of indexed places
    pub fn len(&self) -> usize {
        self.places.len()
    }

    /// Whether the index holds no places
    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

impl OfflineSearchIndex for OfflinePlaceIndex {
    fn search(&self, query: &str) -> Vec<PlaceCandidate> {
        let folded = fold_key(query);
        let tokens: Vec<&str> = folded.split_whitespace().collect();
        if tokens.is_empty() {
            return Vec::new();
        }
        let phrase = tokens.join(" ");

        let mut hits: Vec<(MatchRank, &IndexedPlace)> = self
            .places
            .iter()
            .filter_map(|place| place.rank(&phrase, &tokens).map(|rank| (rank, place)))
            .collect();

        // Stable sort keeps dataset order among equal ranks and lengths
        hits.sort_by_key(|(rank, place)| (*rank, place.name_key.len()));

        hits.into_iter()
            .take(self.limit)
            .map(|(_, place)| place.candidate.clone())
            .collect()
    }
}
