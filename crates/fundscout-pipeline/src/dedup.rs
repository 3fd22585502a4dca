//! Duplicate detection against already-stored opportunities.
//!
//! Two records are the same opportunity when their institutions match
//! case-insensitively and their titles are at least
//! [`TITLE_SIMILARITY_THRESHOLD`] similar by normalized Levenshtein
//! distance.

use std::collections::HashMap;

use fundscout_core::{CandidateOpportunity, PersistedOpportunity};

pub const TITLE_SIMILARITY_THRESHOLD: f64 = 0.8;

/// `(max_len - distance) / max_len` over lower-cased titles, in `[0, 1]`.
/// Two empty titles are identical.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    let distance = strsim::levenshtein(&a, &b);
    (longest - distance) as f64 / longest as f64
}

fn same_institution(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[must_use]
pub fn is_duplicate(candidate: &CandidateOpportunity, existing: &CandidateOpportunity) -> bool {
    same_institution(&candidate.institution, &existing.institution)
        && title_similarity(&candidate.title, &existing.title) >= TITLE_SIMILARITY_THRESHOLD
}

/// First stored record `candidate` duplicates, by full scan.
#[must_use]
pub fn find_duplicate<'a>(
    candidate: &CandidateOpportunity,
    existing: &'a [PersistedOpportunity],
) -> Option<&'a PersistedOpportunity> {
    existing
        .iter()
        .find(|record| is_duplicate(candidate, &record.opportunity))
}

/// Stored titles bucketed by lower-cased institution.
///
/// Gives the same answers as [`find_duplicate`] over the records it was
/// built from, but only compares titles within one institution.
#[derive(Debug, Default)]
pub struct DedupIndex {
    titles_by_institution: HashMap<String, Vec<String>>,
}

impl DedupIndex {
    #[must_use]
    pub fn from_records(records: &[PersistedOpportunity]) -> Self {
        let mut index = Self::default();
        for record in records {
            index.insert(&record.opportunity);
        }
        index
    }

    pub fn insert(&mut self, opportunity: &CandidateOpportunity) {
        self.titles_by_institution
            .entry(opportunity.institution.to_lowercase())
            .or_default()
            .push(opportunity.title.clone());
    }

    #[must_use]
    pub fn is_duplicate(&self, candidate: &CandidateOpportunity) -> bool {
        self.titles_by_institution
            .get(&candidate.institution.to_lowercase())
            .is_some_and(|titles| {
                titles.iter().any(|title| {
                    title_similarity(&candidate.title, title) >= TITLE_SIMILARITY_THRESHOLD
                })
            })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.titles_by_institution.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
