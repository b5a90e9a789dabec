use conflate_model::{BoundingBox, Profile, QueryCondition, QueryGroup};
use conflate_query::render_query;

fn address_profile() -> Profile {
    Profile {
        source: Some("GURS".to_string()),
        dataset_id: Some("gurs:hs_mid".to_string()),
        no_dataset_id: false,
        query: vec![
            QueryGroup::new(vec![QueryCondition::key("addr:housenumber")]),
            QueryGroup::new(vec![QueryCondition::key("addr:street")]),
        ],
        overpass_timeout: 300,
        bbox: Some(BoundingBox {
            south: 45.4,
            west: 13.3,
            north: 46.9,
            east: 16.6,
        }),
        ..Profile::default()
    }
}

#[test]
fn renders_one_statement_per_group_and_unbounded_reference() {
    let query = render_query(&address_profile());
    insta::assert_snapshot!(query, @r#"
    [out:json][timeout:300];
    (
      nwr["addr:housenumber"](45.4,13.3,46.9,16.6);
      nwr["addr:street"](45.4,13.3,46.9,16.6);
      nwr["ref:gurs:hs_mid"];
    );
    out center meta;
    "#);
}

#[test]
fn bounded_update_limits_reference_statement() {
    let mut profile = address_profile();
    profile.bounded_update = true;
    let query = render_query(&profile);
    assert!(query.contains(r#"nwr["ref:gurs:hs_mid"](45.4,13.3,46.9,16.6);"#));
}

#[test]
fn geometry_only_profile_has_no_reference_statement() {
    let mut profile = address_profile();
    profile.dataset_id = None;
    profile.no_dataset_id = true;
    profile.bbox = None;
    profile.query = vec![QueryGroup::new(vec![
        QueryCondition::matching("amenity", "fuel"),
        QueryCondition::key("ref:mise"),
    ])];
    let query = render_query(&profile);
    assert_eq!(
        query,
        "[out:json][timeout:300];\n(\n  nwr[\"amenity\"~\"^(fuel)$\"][\"ref:mise\"];\n);\nout center meta;"
    );
}
