use std::collections::{BTreeMap, BTreeSet};

/// Per-collection table of item indices the upstream service is known to
/// answer with "not found". Indices listed here are never requested.
#[derive(Debug, Clone, Default)]
pub struct KnownGaps {
    gaps: BTreeMap<String, BTreeSet<u32>>,
}

impl KnownGaps {
    /// SWAPI returns 404 for person #17.
    pub fn swapi_defaults() -> Self {
        Self::default().register("people", [17])
    }

    /// Add indices for a collection (merged with any already registered).
    pub fn register(mut self, collection: impl Into<String>, indices: impl IntoIterator<Item = u32>) -> Self {
        self.gaps.entry(collection.into()).or_default().extend(indices);
        self
    }

    pub fn is_gap(&self, collection: &str, index: u32) -> bool {
        self.gaps
            .get(collection)
            .is_some_and(|set| set.contains(&index))
    }

    /// Number of known gaps falling inside `1..=count`.
    pub fn gaps_within(&self, collection: &str, count: u32) -> usize {
        if count == 0 {
            return 0;
        }
        self.gaps
            .get(collection)
            .map(|set| set.range(1..=count).count())
            .unwrap_or(0)
    }

    /// Records a complete fetch should yield for a collection reporting `count`.
    pub fn expected_records(&self, collection: &str, count: u32) -> usize {
        (count as usize).saturating_sub(self.gaps_within(collection, count))
    }

    /// `Some(expected)` when `fetched` falls short of (or exceeds) what `count` promises.
    pub fn shortfall(&self, collection: &str, count: u32, fetched: usize) -> Option<usize> {
        let expected = self.expected_records(collection, count);
        (fetched != expected).then_some(expected)
    }
}
