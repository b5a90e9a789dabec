use std::collections::BTreeSet;

use conflate_match::{MatchOutcome, Matcher};
use conflate_model::{
    DatasetFeature, DatasetId, DatasetState, Feature, MatchMethod, MatchResult, OsmFeature, OsmId,
    Position, Profile, QueryCondition, QueryGroup,
};
use conflate_query::Predicate;
use conflate_spatial::haversine_distance;
use proptest::prelude::*;

fn address_profile(max_distance: f64, duplicate_distance: f64) -> Profile {
    Profile {
        query: vec![QueryGroup::new(vec![QueryCondition::key("addr:housenumber")])],
        max_distance,
        duplicate_distance,
        ..Profile::default()
    }
}

fn run(profile: &Profile, dataset: &[DatasetFeature], osm: &[OsmFeature]) -> MatchOutcome {
    let predicate = Predicate::compile(&profile.query).expect("query compiles");
    Matcher::new(profile, &predicate).run(dataset, osm)
}

fn dataset_point(id: usize, lat: f64, lon: f64) -> DatasetFeature {
    Feature::new(DatasetId::new(id.to_string()).unwrap(), Position::new(lat, lon))
        .with_tag("addr:housenumber", id.to_string())
}

fn osm_point(id: usize, lat: f64, lon: f64) -> OsmFeature {
    Feature::new(OsmId::node(id as i64), Position::new(lat, lon))
        .with_tag("addr:housenumber", "1")
}

#[test]
fn nearby_feature_is_matched() {
    let dataset = vec![
        Feature::new(DatasetId::new("A").unwrap(), Position::new(46.0, 14.5))
            .with_tag("addr:housenumber", "12"),
    ];
    let osm = vec![
        Feature::new(OsmId::node(100), Position::new(46.00005, 14.50005))
            .with_tag("addr:housenumber", "10")
            .with_tag("amenity", "shop"),
    ];
    let outcome = run(&address_profile(10.0, 0.0), &dataset, &osm);

    let results = outcome.results(&dataset, &osm);
    assert_eq!(results.len(), 1);
    match &results[0] {
        MatchResult::Matched {
            dataset_id,
            osm_id,
            method,
            distance_m,
        } => {
            assert_eq!(dataset_id.as_str(), "A");
            assert_eq!(*osm_id, OsmId::node(100));
            assert_eq!(*method, MatchMethod::Distance);
            assert!(*distance_m < 10.0);
        }
        other => panic!("expected a match, got {other:?}"),
    }
    assert_eq!(
        outcome.dataset_states[0],
        DatasetState::Matched {
            osm_id: OsmId::node(100)
        }
    );
}

#[test]
fn colocated_dataset_features_are_duplicates() {
    let dataset = vec![dataset_point(1, 46.0, 14.5), dataset_point(2, 46.0, 14.5)];
    let outcome = run(&address_profile(10.0, 0.0), &dataset, &[]);

    assert_eq!(
        outcome.dataset_states[1],
        DatasetState::DuplicateOf {
            canonical: DatasetId::new("1").unwrap()
        }
    );
    assert_eq!(outcome.dataset_states[0], DatasetState::Unmatched);
}

#[test]
fn unclaimed_osm_feature_is_an_orphan() {
    let dataset = vec![dataset_point(1, 46.0, 14.5)];
    let osm = vec![
        osm_point(7, 46.01, 14.5),
        Feature::new(OsmId::way(8), Position::new(46.01, 14.5)).with_tag("building", "yes"),
    ];
    let outcome = run(&address_profile(10.0, 0.0), &dataset, &osm);

    assert_eq!(outcome.orphans, vec![0], "only features passing the query");
    assert_eq!(outcome.unmatched, vec![0]);
}

#[test]
fn empty_osm_side_leaves_everything_unmatched() {
    let dataset = vec![dataset_point(1, 46.0, 14.5), dataset_point(2, 46.1, 14.5)];
    let outcome = run(&address_profile(100.0, 0.0), &dataset, &[]);
    assert_eq!(outcome.unmatched, vec![0, 1]);
    assert!(outcome.diagnostics.is_empty());
}

#[test]
fn contested_feature_goes_to_the_closer_claim() {
    // Dataset 1 is ~11 m from the OSM feature, dataset 2 is ~5.5 m.
    let dataset = vec![dataset_point(1, 46.0, 14.5), dataset_point(2, 46.00015, 14.5)];
    let osm = vec![osm_point(1, 46.0001, 14.5)];
    let outcome = run(&address_profile(50.0, 0.0), &dataset, &osm);

    assert_eq!(outcome.matches.len(), 1);
    assert_eq!(outcome.matches[0].dataset, 1);
    assert_eq!(outcome.unmatched, vec![0]);
}

fn arb_points(max: usize) -> impl Strategy<Value = Vec<(f64, f64)>> {
    proptest::collection::vec((-0.001f64..0.001, -0.001f64..0.001), 0..max)
}

fn build(dataset: &[(f64, f64)], osm: &[(f64, f64)]) -> (Vec<DatasetFeature>, Vec<OsmFeature>) {
    let dataset = dataset
        .iter()
        .enumerate()
        .map(|(i, (dlat, dlon))| dataset_point(i, 46.0 + dlat, 14.5 + dlon))
        .collect();
    let osm = osm
        .iter()
        .enumerate()
        .map(|(i, (dlat, dlon))| osm_point(i, 46.0 + dlat, 14.5 + dlon))
        .collect();
    (dataset, osm)
}

proptest! {
    #[test]
    fn osm_features_are_claimed_at_most_once(
        dataset in arb_points(30),
        osm in arb_points(30),
        max_distance in 0.0f64..200.0,
    ) {
        let (dataset, osm) = build(&dataset, &osm);
        let outcome = run(&address_profile(max_distance, 0.0), &dataset, &osm);

        prop_assert_eq!(outcome.conflicting_claims(), 0);
        let claimed: BTreeSet<usize> = outcome.matches.iter().map(|pair| pair.osm).collect();
        for &orphan in &outcome.orphans {
            prop_assert!(!claimed.contains(&orphan));
        }
        for pair in &outcome.matches {
            prop_assert!(pair.distance_m <= max_distance);
        }
        prop_assert!(outcome.dataset_states.iter().all(DatasetState::is_terminal));
    }

    #[test]
    fn larger_radius_never_loses_a_match(
        dataset in arb_points(25),
        osm in arb_points(25),
        small in 0.0f64..100.0,
        extra in 0.0f64..100.0,
    ) {
        let (dataset, osm) = build(&dataset, &osm);
        let narrow = run(&address_profile(small, 0.0), &dataset, &osm);
        let wide = run(&address_profile(small + extra, 0.0), &dataset, &osm);

        for pair in &narrow.matches {
            prop_assert!(wide.matches.contains(pair), "lost {:?}", pair);
        }
        for idx in &wide.unmatched {
            prop_assert!(narrow.unmatched.contains(idx));
        }
    }

    #[test]
    fn duplicate_iff_within_duplicate_distance(
        offset in (-0.0005f64..0.0005, -0.0005f64..0.0005),
        duplicate_distance in 0.0f64..60.0,
    ) {
        let dataset = vec![
            dataset_point(1, 46.0, 14.5),
            dataset_point(2, 46.0 + offset.0, 14.5 + offset.1),
        ];
        let distance = haversine_distance(dataset[0].position, dataset[1].position);
        let outcome = run(&address_profile(100.0, duplicate_distance), &dataset, &[]);

        let is_duplicate = matches!(outcome.dataset_states[1], DatasetState::DuplicateOf { .. });
        prop_assert_eq!(is_duplicate, distance <= duplicate_distance);
    }
}
