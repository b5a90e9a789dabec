//! Overpass QL rendering of a profile query, for the external OSM provider.

use conflate_model::{BoundingBox, Profile, QueryCondition};

/// Builds the Overpass QL request that fetches candidate features for `profile`.
///
/// Each query group becomes one `nwr` statement. When the profile writes a
/// reference tag, features already carrying it are fetched as well; with
/// `bounded_update` that statement is also limited to the bounding box.
pub fn render_query(profile: &Profile) -> String {
    let bbox = profile.bbox.as_ref().map(render_bbox).unwrap_or_default();
    let mut lines = vec![
        format!("[out:json][timeout:{}];", profile.overpass_timeout),
        "(".to_string(),
    ];
    for group in &profile.query {
        let mut statement = String::from("  nwr");
        for condition in group.iter() {
            statement.push_str(&render_condition(condition));
        }
        statement.push_str(&bbox);
        statement.push(';');
        lines.push(statement);
    }
    if let Some(reference) = profile.reference_tag() {
        let scope = if profile.bounded_update { bbox.as_str() } else { "" };
        lines.push(format!("  nwr[\"{}\"]{scope};", escape(&reference)));
    }
    lines.push(");".to_string());
    lines.push("out center meta;".to_string());
    lines.join("\n")
}

fn render_condition(condition: &QueryCondition) -> String {
    match &condition.value_pattern {
        None => format!("[\"{}\"]", escape(&condition.key)),
        Some(pattern) => format!(
            "[\"{}\"~\"^({})$\"]",
            escape(&condition.key),
            escape(pattern)
        ),
    }
}

fn render_bbox(bbox: &BoundingBox) -> String {
    format!(
        "({},{},{},{})",
        bbox.south, bbox.west, bbox.north, bbox.east
    )
}

fn escape(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_quotes_and_backslashes() {
        assert_eq!(escape(r#"a"b\c"#), r#"a\"b\\c"#);
    }

    #[test]
    fn pattern_condition_is_anchored() {
        let rendered = render_condition(&QueryCondition::matching("amenity", "fuel|charging"));
        assert_eq!(rendered, r#"["amenity"~"^(fuel|charging)$"]"#);
    }
}
