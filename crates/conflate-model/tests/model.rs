//! Tests for conflate-model types.

use conflate_model::{
    Action, ActionKind, ComputeFn, ComputeRegistry, DatasetId, DatasetState, Diagnostic,
    DiagnosticKind, Feature, FeatureDataError, MatchMethod, MatchResult, OsmFeature, OsmId,
    Position, Tags,
};

#[test]
fn match_result_round_trips_through_json() {
    let result = MatchResult::Matched {
        dataset_id: DatasetId::new("11026406").expect("dataset id"),
        osm_id: OsmId::way(31),
        method: MatchMethod::Reference,
        distance_m: 3.5,
    };
    let json = serde_json::to_string(&result).expect("serialize result");
    assert!(json.contains(r#""result":"matched""#));
    assert!(json.contains(r#""method":"reference""#));
    let round: MatchResult = serde_json::from_str(&json).expect("deserialize result");
    assert_eq!(round, result);
}

#[test]
fn osm_feature_reads_without_tags() {
    let feature: OsmFeature =
        serde_json::from_str(r#"{"id":"n12","position":{"lat":46.0,"lon":14.5}}"#)
            .expect("deserialize feature");
    assert_eq!(feature.id, OsmId::node(12));
    assert!(feature.tags.is_empty());
    assert_eq!(feature.validate(), Ok(()));
}

#[test]
fn feature_with_empty_key_is_invalid() {
    let feature = Feature::new(OsmId::node(1), Position::new(46.0, 14.5)).with_tag("", "x");
    assert_eq!(feature.validate(), Err(FeatureDataError::EmptyTagKey));

    let diagnostic = Diagnostic::feature_data("node/1", &FeatureDataError::EmptyTagKey);
    assert_eq!(diagnostic.kind, DiagnosticKind::FeatureData);
    assert_eq!(diagnostic.subject, "node/1");
}

#[test]
fn action_kinds() {
    let actions = [
        Action::Create {
            position: Position::new(46.0, 14.5),
            tags: Tags::new(),
        },
        Action::Delete {
            osm_id: OsmId::relation(4),
        },
    ];
    let kinds: Vec<_> = actions.iter().map(Action::kind).collect();
    assert_eq!(kinds, vec![ActionKind::Create, ActionKind::Delete]);
    assert_eq!(ActionKind::Update.as_str(), "update");
}

#[test]
fn registry_resolves_registered_functions() {
    let registry = ComputeRegistry::new().with(ComputeFn::new("street_upper", |tags: &Tags| {
        tags.get("addr:street").map(|street| street.to_uppercase())
    }));
    let tags = Tags::from([("addr:street".to_string(), "Trubarjeva".to_string())]);

    let function = registry.get("street_upper").expect("registered");
    assert_eq!(function.name(), "street_upper");
    assert_eq!(function.call(&tags).as_deref(), Some("TRUBARJEVA"));
    assert!(registry.get("missing").is_none());
    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["street_upper"]);
}

#[test]
fn skipped_state_is_terminal() {
    let json = serde_json::to_string(&DatasetState::Skipped).expect("serialize state");
    assert_eq!(json, r#"{"state":"skipped"}"#);
    assert!(DatasetState::Skipped.is_terminal());
}
