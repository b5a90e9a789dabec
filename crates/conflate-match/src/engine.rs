//! Matching engine implementation.
//!
//! A pass runs in four steps over validated inputs:
//!
//! 1. **Duplicates**: a dataset feature within `duplicate_distance` of an
//!    earlier canonical feature becomes `DuplicateOf` that feature.
//! 2. **References**: when the profile writes a `ref:<dataset_id>` tag, OSM
//!    features already carrying a dataset id are paired with it directly.
//! 3. **Distance**: every remaining (dataset, OSM) pair within `max_distance`
//!    is ordered by distance in steps of `EQUIDISTANCE_TOLERANCE_M`, then by
//!    dataset input order and OSM id, and assigned greedily while both sides
//!    are free. Among free candidates within tolerance of each other the
//!    smallest OSM id wins.
//! 4. **Orphans**: OSM features satisfying the query that nobody claimed.
//!
//! Radius queries run on the rayon pool; every decision that depends on order
//! is taken sequentially afterwards, so results do not depend on scheduling.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use tracing::{debug, info, info_span, warn};

use conflate_model::{
    DatasetFeature, DatasetState, Diagnostic, Feature, FeatureDataError, MatchMethod, OsmFeature,
    OsmId, Profile,
};
use conflate_query::Predicate;
use conflate_spatial::{SpatialIndex, haversine_distance};

use crate::types::{EQUIDISTANCE_TOLERANCE_M, MatchOutcome, MatchedPair};

/// Pairs dataset features with existing OSM features according to a profile.
pub struct Matcher<'p> {
    profile: &'p Profile,
    predicate: &'p Predicate,
}

struct Candidate {
    distance_m: f64,
    dataset: usize,
    osm_id: OsmId,
    osm: usize,
}

impl<'p> Matcher<'p> {
    /// The profile is expected to be validated and `predicate` compiled from its query.
    pub fn new(profile: &'p Profile, predicate: &'p Predicate) -> Self {
        Self { profile, predicate }
    }

    pub fn run(&self, dataset: &[DatasetFeature], osm: &[OsmFeature]) -> MatchOutcome {
        let span = info_span!(
            "match",
            dataset = dataset.len(),
            osm = osm.len(),
            max_distance = self.profile.max_distance
        );
        let _guard = span.enter();

        let mut outcome = MatchOutcome {
            dataset_states: vec![DatasetState::Unprocessed; dataset.len()],
            ..MatchOutcome::default()
        };

        let valid_dataset = validate_features(
            dataset,
            "dataset",
            &mut outcome.skipped_dataset,
            &mut outcome.diagnostics,
        );
        let valid_osm = validate_features(
            osm,
            "osm",
            &mut outcome.skipped_osm,
            &mut outcome.diagnostics,
        );
        for &idx in &outcome.skipped_dataset {
            outcome.dataset_states[idx] = DatasetState::Skipped;
        }
        let eligible_osm: Vec<usize> = valid_osm
            .iter()
            .copied()
            .filter(|&idx| self.predicate.matches(&osm[idx]))
            .collect();
        debug!(
            valid_dataset = valid_dataset.len(),
            valid_osm = valid_osm.len(),
            eligible_osm = eligible_osm.len(),
            "inputs validated"
        );

        let canonical = self.mark_duplicates(dataset, &valid_dataset, &mut outcome);

        let mut claimed = vec![false; osm.len()];
        let mut matched = vec![false; dataset.len()];
        let mut pairs = self.match_references(dataset, osm, &canonical, &valid_osm);
        for pair in &pairs {
            claimed[pair.osm] = true;
            matched[pair.dataset] = true;
        }

        let pending: Vec<usize> = canonical
            .iter()
            .copied()
            .filter(|&idx| !matched[idx])
            .collect();
        pairs.extend(self.match_distances(
            dataset,
            osm,
            &pending,
            &eligible_osm,
            &mut claimed,
            &mut outcome.diagnostics,
        ));

        pairs.sort_by_key(|pair| pair.dataset);
        for pair in &pairs {
            matched[pair.dataset] = true;
            outcome.dataset_states[pair.dataset] = DatasetState::Matched {
                osm_id: osm[pair.osm].id,
            };
        }
        for &idx in &canonical {
            if !matched[idx] {
                outcome.dataset_states[idx] = DatasetState::Unmatched;
                outcome.unmatched.push(idx);
            }
        }
        outcome.orphans = eligible_osm
            .into_iter()
            .filter(|&idx| !claimed[idx])
            .collect();
        outcome.matches = pairs;

        info!(
            matched = outcome.matches.len(),
            unmatched = outcome.unmatched.len(),
            duplicates = outcome.duplicates.len(),
            orphans = outcome.orphans.len(),
            skipped = outcome.skipped_dataset.len() + outcome.skipped_osm.len(),
            "matching finished"
        );
        outcome
    }

    /// Classifies duplicates and returns the canonical dataset indices in input order.
    fn mark_duplicates(
        &self,
        dataset: &[DatasetFeature],
        valid: &[usize],
        outcome: &mut MatchOutcome,
    ) -> Vec<usize> {
        let index = SpatialIndex::build_with(dataset, valid.iter().copied());
        let radius = self.profile.duplicate_distance;
        let neighbors: Vec<Vec<usize>> = valid
            .par_iter()
            .map(|&idx| {
                index
                    .nearest(dataset[idx].position, radius)
                    .into_iter()
                    .map(|n| n.index)
                    .filter(|&other| other < idx)
                    .collect()
            })
            .collect();

        let mut is_canonical = vec![false; dataset.len()];
        let mut canonical = Vec::with_capacity(valid.len());
        for (&idx, earlier) in valid.iter().zip(neighbors) {
            match earlier.into_iter().filter(|&other| is_canonical[other]).min() {
                Some(first) => {
                    debug!(
                        duplicate = %dataset[idx].id,
                        canonical = %dataset[first].id,
                        "duplicate dataset feature"
                    );
                    outcome.dataset_states[idx] = DatasetState::DuplicateOf {
                        canonical: dataset[first].id.clone(),
                    };
                    outcome.duplicates.push((idx, first));
                }
                None => {
                    is_canonical[idx] = true;
                    canonical.push(idx);
                }
            }
        }
        canonical
    }

    fn match_references(
        &self,
        dataset: &[DatasetFeature],
        osm: &[OsmFeature],
        canonical: &[usize],
        valid_osm: &[usize],
    ) -> Vec<MatchedPair> {
        let Some(reference_tag) = self.profile.reference_tag() else {
            return Vec::new();
        };

        // Reference value -> OSM features carrying it, ordered by OSM id.
        let mut by_reference: BTreeMap<&str, BTreeSet<(OsmId, usize)>> = BTreeMap::new();
        for &idx in valid_osm {
            let Some(value) = osm[idx].tag(&reference_tag) else {
                continue;
            };
            for reference in value.split(';').map(str::trim).filter(|r| !r.is_empty()) {
                by_reference
                    .entry(reference)
                    .or_default()
                    .insert((osm[idx].id, idx));
            }
        }
        if by_reference.is_empty() {
            return Vec::new();
        }

        let mut claimed = BTreeSet::new();
        let mut pairs = Vec::new();
        for &idx in canonical {
            let feature = &dataset[idx];
            let Some(candidates) = by_reference.get(feature.id.as_str()) else {
                continue;
            };
            let Some(&(osm_id, osm_idx)) = candidates.iter().find(|(_, o)| !claimed.contains(o))
            else {
                continue;
            };
            claimed.insert(osm_idx);
            debug!(dataset_id = %feature.id, %osm_id, "matched by reference tag");
            pairs.push(MatchedPair {
                dataset: idx,
                osm: osm_idx,
                method: MatchMethod::Reference,
                distance_m: haversine_distance(feature.position, osm[osm_idx].position),
            });
        }
        pairs
    }

    fn match_distances(
        &self,
        dataset: &[DatasetFeature],
        osm: &[OsmFeature],
        pending: &[usize],
        eligible_osm: &[usize],
        claimed: &mut [bool],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<MatchedPair> {
        let index = SpatialIndex::build_with(
            osm,
            eligible_osm.iter().copied().filter(|&idx| !claimed[idx]),
        );
        let radius = self.profile.max_distance;
        let per_feature: Vec<Vec<Candidate>> = pending
            .par_iter()
            .map(|&idx| {
                index
                    .nearest(dataset[idx].position, radius)
                    .into_iter()
                    .map(|n| Candidate {
                        distance_m: n.distance_m,
                        dataset: idx,
                        osm_id: n.feature.id,
                        osm: n.index,
                    })
                    .collect()
            })
            .collect();

        let mut candidates: Vec<&Candidate> = per_feature.iter().flatten().collect();
        candidates.sort_by(|a, b| {
            distance_bucket(a.distance_m)
                .total_cmp(&distance_bucket(b.distance_m))
                .then(a.dataset.cmp(&b.dataset))
                .then(a.osm_id.cmp(&b.osm_id))
        });
        let alternatives: BTreeMap<usize, &[Candidate]> = pending
            .iter()
            .copied()
            .zip(per_feature.iter().map(Vec::as_slice))
            .collect();

        let mut assigned = BTreeSet::new();
        let mut pairs = Vec::new();
        for candidate in candidates {
            if assigned.contains(&candidate.dataset) || claimed[candidate.osm] {
                continue;
            }
            let rivals: Vec<&Candidate> = alternatives[&candidate.dataset]
                .iter()
                .filter(|other| {
                    other.osm != candidate.osm
                        && !claimed[other.osm]
                        && (other.distance_m - candidate.distance_m).abs()
                            <= EQUIDISTANCE_TOLERANCE_M
                })
                .collect();
            // Equidistant within tolerance: smallest OSM id wins.
            let chosen = rivals
                .iter()
                .copied()
                .fold(candidate, |best, other| {
                    if other.osm_id < best.osm_id { other } else { best }
                });
            if !rivals.is_empty() {
                let others: Vec<String> = rivals
                    .iter()
                    .copied()
                    .chain([candidate])
                    .filter(|other| other.osm != chosen.osm)
                    .map(|other| other.osm_id.to_string())
                    .collect();
                let message = format!(
                    "{} and {} are equidistant at {:.3} m; chose {}",
                    chosen.osm_id,
                    others.join(", "),
                    chosen.distance_m,
                    chosen.osm_id
                );
                warn!(dataset_id = %dataset[chosen.dataset].id, "{message}");
                diagnostics.push(Diagnostic::ambiguous_match(
                    format!("dataset:{}", dataset[chosen.dataset].id),
                    message,
                ));
            }
            claimed[chosen.osm] = true;
            assigned.insert(chosen.dataset);
            pairs.push(MatchedPair {
                dataset: chosen.dataset,
                osm: chosen.osm,
                method: MatchMethod::Distance,
                distance_m: chosen.distance_m,
            });
        }
        pairs
    }
}

/// Distances within the same tolerance step compare equal.
fn distance_bucket(distance_m: f64) -> f64 {
    (distance_m / EQUIDISTANCE_TOLERANCE_M).floor()
}

/// Returns indices of usable features; records a diagnostic for each skipped one.
fn validate_features<I>(
    features: &[Feature<I>],
    side: &str,
    skipped: &mut Vec<usize>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<usize>
where
    I: Ord + std::fmt::Display,
{
    let mut seen = BTreeSet::new();
    let mut valid = Vec::with_capacity(features.len());
    for (idx, feature) in features.iter().enumerate() {
        let checked = feature.validate().and_then(|()| {
            if seen.insert(&feature.id) {
                Ok(())
            } else {
                Err(FeatureDataError::DuplicateId)
            }
        });
        match checked {
            Ok(()) => valid.push(idx),
            Err(error) => {
                let subject = format!("{side}:{}", feature.id);
                warn!(subject = %subject, %error, "skipping feature");
                diagnostics.push(Diagnostic::feature_data(subject, &error));
                skipped.push(idx);
            }
        }
    }
    valid
}

#[cfg(test)]
mod tests {
    use conflate_model::{DatasetId, Position, QueryCondition, QueryGroup};

    use super::*;

    fn profile() -> Profile {
        Profile {
            query: vec![QueryGroup::new(vec![QueryCondition::key("addr:housenumber")])],
            ..Profile::default()
        }
    }

    fn dataset(id: &str, lat: f64, lon: f64) -> DatasetFeature {
        Feature::new(DatasetId::new(id).unwrap(), Position::new(lat, lon))
    }

    fn address(id: i64, lat: f64, lon: f64) -> OsmFeature {
        Feature::new(OsmId::node(id), Position::new(lat, lon)).with_tag("addr:housenumber", "1")
    }

    #[test]
    fn malformed_and_repeated_ids_are_skipped() {
        let profile = profile();
        let predicate = Predicate::compile(&profile.query).unwrap();
        let data = vec![
            dataset("1", 46.0, 14.5),
            dataset("2", f64::NAN, 14.5),
            dataset("1", 47.0, 14.5),
        ];
        let outcome = Matcher::new(&profile, &predicate).run(&data, &[]);
        assert_eq!(outcome.skipped_dataset, vec![1, 2]);
        assert_eq!(outcome.diagnostics.len(), 2);
        assert_eq!(outcome.dataset_states[1], DatasetState::Skipped);
        assert_eq!(outcome.dataset_states[2], DatasetState::Skipped);
        assert_eq!(outcome.unmatched, vec![0]);
    }

    #[test]
    fn duplicate_attaches_to_earliest_canonical() {
        let profile = Profile {
            duplicate_distance: 10.0,
            ..profile()
        };
        let predicate = Predicate::compile(&profile.query).unwrap();
        // ~5.6 m apart along a meridian; 2 is within range of 1 and of 3.
        let data = vec![
            dataset("1", 46.0, 14.5),
            dataset("2", 46.00005, 14.5),
            dataset("3", 46.0001, 14.5),
        ];
        let outcome = Matcher::new(&profile, &predicate).run(&data, &[]);
        assert_eq!(outcome.duplicates, vec![(1, 0)]);
        assert_eq!(outcome.unmatched, vec![0, 2]);
    }

    #[test]
    fn reference_tag_wins_over_a_closer_feature() {
        let profile = Profile {
            dataset_id: Some("gurs".to_string()),
            no_dataset_id: false,
            ..profile()
        };
        let predicate = Predicate::compile(&profile.query).unwrap();
        let data = vec![dataset("A", 46.0, 14.5)];
        let osm = vec![
            address(1, 46.0, 14.5),
            address(2, 46.0003, 14.5).with_tag("ref:gurs", "X;A"),
        ];
        let outcome = Matcher::new(&profile, &predicate).run(&data, &osm);
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].osm, 1);
        assert_eq!(outcome.matches[0].method, MatchMethod::Reference);
        assert_eq!(outcome.orphans, vec![0]);
    }

    #[test]
    fn equidistant_candidates_are_reported() {
        let profile = profile();
        let predicate = Predicate::compile(&profile.query).unwrap();
        let data = vec![dataset("A", 46.0, 14.5)];
        let osm = vec![address(9, 46.0001, 14.5), address(3, 46.0001, 14.5)];
        let outcome = Matcher::new(&profile, &predicate).run(&data, &osm);
        assert_eq!(outcome.matches[0].osm, 1, "lower OSM id wins the tie");
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(
            outcome.diagnostics[0].kind,
            conflate_model::DiagnosticKind::AmbiguousMatch
        );
    }

    #[test]
    fn near_equal_distances_go_to_the_smaller_id() {
        let profile = profile();
        let predicate = Predicate::compile(&profile.query).unwrap();
        let data = vec![dataset("A", 46.0, 14.5)];
        // node/9 is about a micrometre closer than node/3.
        let osm = vec![address(9, 46.0001, 14.5), address(3, 45.99989999999, 14.5)];
        let outcome = Matcher::new(&profile, &predicate).run(&data, &osm);
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(osm[outcome.matches[0].osm].id, OsmId::node(3));
        assert_eq!(outcome.orphans, vec![0]);
        assert_eq!(outcome.diagnostics.len(), 1);
        assert!(outcome.diagnostics[0].message.contains("chose node/3"));
    }

    #[test]
    fn tolerance_ties_across_features_follow_input_order() {
        let profile = profile();
        let predicate = Predicate::compile(&profile.query).unwrap();
        // Both dataset features are ~11.1 m from node/5; B is marginally closer.
        let data = vec![dataset("A", 46.0, 14.5), dataset("B", 45.99999999999, 14.5)];
        let osm = vec![address(5, 45.9999, 14.5)];
        let outcome = Matcher::new(&profile, &predicate).run(&data, &osm);
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].dataset, 0);
        assert_eq!(outcome.unmatched, vec![1]);
    }
}
