//! Output of a matching pass.

use conflate_model::{
    DatasetFeature, DatasetState, Diagnostic, MatchMethod, MatchResult, OsmFeature,
};

/// Distances closer than this are reported as ambiguous candidates, in meters.
pub const EQUIDISTANCE_TOLERANCE_M: f64 = 1e-3;

/// A dataset feature paired with an existing OSM feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedPair {
    /// Index into the dataset input.
    pub dataset: usize,
    /// Index into the OSM input.
    pub osm: usize,
    pub method: MatchMethod,
    pub distance_m: f64,
}

/// Everything the matcher decided about one pair of inputs.
///
/// Index-based fields refer to positions in the slices passed to
/// [`crate::Matcher::run`].
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    /// Final state per dataset feature, parallel to the dataset input.
    /// Features dropped as malformed end as [`DatasetState::Skipped`].
    pub dataset_states: Vec<DatasetState>,
    /// Matched pairs in dataset input order.
    pub matches: Vec<MatchedPair>,
    /// Dataset features without a counterpart, in input order.
    pub unmatched: Vec<usize>,
    /// Dataset features classified as duplicates: `(duplicate, canonical)`.
    pub duplicates: Vec<(usize, usize)>,
    /// OSM features satisfying the query that no dataset feature claimed.
    pub orphans: Vec<usize>,
    /// Dataset features skipped because of malformed data.
    pub skipped_dataset: Vec<usize>,
    /// OSM features skipped because of malformed data.
    pub skipped_osm: Vec<usize>,
    pub diagnostics: Vec<Diagnostic>,
}

impl MatchOutcome {
    /// Tagged results: matches and unmatched features in dataset order, then orphans.
    pub fn results(&self, dataset: &[DatasetFeature], osm: &[OsmFeature]) -> Vec<MatchResult> {
        let mut per_dataset: Vec<(usize, MatchResult)> = self
            .matches
            .iter()
            .map(|pair| {
                (
                    pair.dataset,
                    MatchResult::Matched {
                        dataset_id: dataset[pair.dataset].id.clone(),
                        osm_id: osm[pair.osm].id,
                        method: pair.method,
                        distance_m: pair.distance_m,
                    },
                )
            })
            .chain(self.unmatched.iter().map(|&idx| {
                (
                    idx,
                    MatchResult::Unmatched {
                        dataset_id: dataset[idx].id.clone(),
                    },
                )
            }))
            .collect();
        per_dataset.sort_by_key(|(idx, _)| *idx);

        per_dataset
            .into_iter()
            .map(|(_, result)| result)
            .chain(self.orphans.iter().map(|&idx| MatchResult::Orphan {
                osm_id: osm[idx].id,
            }))
            .collect()
    }

    /// Number of OSM features claimed by more than one dataset feature. Always zero.
    pub fn conflicting_claims(&self) -> usize {
        let mut claimed: Vec<usize> = self.matches.iter().map(|pair| pair.osm).collect();
        claimed.sort_unstable();
        let total = claimed.len();
        claimed.dedup();
        total - claimed.len()
    }
}
