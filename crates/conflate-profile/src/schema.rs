//! Raw on-disk profile shape and its conversion into the model.

use std::collections::BTreeMap;

use serde::Deserialize;

use conflate_model::{
    BoundingBox, ComputeRegistry, ConfigError, DEFAULT_DUPLICATE_DISTANCE, DEFAULT_MAX_DISTANCE,
    DEFAULT_OVERPASS_TIMEOUT, Profile, QueryCondition, QueryGroup, TransformEntry, TransformRule,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawProfile {
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    add_source: Option<bool>,
    #[serde(default)]
    dataset_id: Option<String>,
    #[serde(default)]
    no_dataset_id: Option<bool>,
    /// Kept untyped so shape errors can name the offending group and condition.
    #[serde(default)]
    query: Option<toml::Value>,
    #[serde(default)]
    master_tags: Vec<String>,
    #[serde(default)]
    delete_unmatched: bool,
    #[serde(default)]
    tag_unmatched: BTreeMap<String, String>,
    #[serde(default)]
    max_distance: Option<f64>,
    #[serde(default)]
    duplicate_distance: Option<f64>,
    #[serde(default)]
    transform: Vec<RawTransform>,
    #[serde(default)]
    bounded_update: bool,
    #[serde(default)]
    overpass_timeout: Option<u32>,
    #[serde(default)]
    bbox: Option<[f64; 4]>,
}

#[derive(Debug, Deserialize)]
struct RawTransform {
    key: String,
    #[serde(flatten)]
    action: RawAction,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum RawAction {
    Rename { to: String },
    Remove,
    Set { value: String },
    Compute { function: String },
}

impl RawProfile {
    pub(crate) fn into_profile(self, registry: &ComputeRegistry) -> Result<Profile, ConfigError> {
        let query = match self.query {
            Some(value) => parse_query(&value)?,
            None => return Err(ConfigError::EmptyQuery),
        };
        let transform = self
            .transform
            .into_iter()
            .enumerate()
            .map(|(index, raw)| raw.resolve(index, registry))
            .collect::<Result<Vec<_>, _>>()?;
        let no_dataset_id = self.no_dataset_id.unwrap_or(self.dataset_id.is_none());

        Ok(Profile {
            source: self.source,
            add_source: self.add_source.unwrap_or(true),
            dataset_id: self.dataset_id,
            no_dataset_id,
            query,
            master_tags: self.master_tags,
            delete_unmatched: self.delete_unmatched,
            tag_unmatched: self.tag_unmatched,
            max_distance: self.max_distance.unwrap_or(DEFAULT_MAX_DISTANCE),
            duplicate_distance: self.duplicate_distance.unwrap_or(DEFAULT_DUPLICATE_DISTANCE),
            transform,
            bounded_update: self.bounded_update,
            overpass_timeout: self.overpass_timeout.unwrap_or(DEFAULT_OVERPASS_TIMEOUT),
            bbox: self.bbox.map(|[south, west, north, east]| BoundingBox {
                south,
                west,
                north,
                east,
            }),
        })
    }
}

impl RawTransform {
    fn resolve(
        self,
        index: usize,
        registry: &ComputeRegistry,
    ) -> Result<TransformEntry, ConfigError> {
        let rule = match self.action {
            RawAction::Rename { to } => TransformRule::Rename(to),
            RawAction::Remove => TransformRule::Remove,
            RawAction::Set { value } => TransformRule::Set(value),
            RawAction::Compute { function } => match registry.get(&function) {
                Some(compute) => TransformRule::Compute(compute.clone()),
                None => {
                    return Err(ConfigError::UnknownComputeFunction {
                        index,
                        name: function,
                    });
                }
            },
        };
        Ok(TransformEntry::new(self.key, rule))
    }
}

/// `query = [["addr:housenumber"], ["addr:street", "^Ulica"]]`
///
/// Each group is an array of conditions; a condition is a key string or a
/// `[key, pattern]` pair.
fn parse_query(value: &toml::Value) -> Result<Vec<QueryGroup>, ConfigError> {
    let toml::Value::Array(groups) = value else {
        return Err(shape_error(0, 0, "query must be an array of groups"));
    };
    if groups.is_empty() {
        return Err(ConfigError::EmptyQuery);
    }
    groups
        .iter()
        .enumerate()
        .map(|(group_idx, group)| {
            let toml::Value::Array(conditions) = group else {
                return Err(shape_error(
                    group_idx,
                    0,
                    "group must be an array of conditions",
                ));
            };
            if conditions.is_empty() {
                return Err(ConfigError::EmptyQueryGroup { group: group_idx });
            }
            conditions
                .iter()
                .enumerate()
                .map(|(cond_idx, condition)| parse_condition(group_idx, cond_idx, condition))
                .collect::<Result<Vec<_>, _>>()
                .map(QueryGroup::new)
        })
        .collect()
}

fn parse_condition(
    group: usize,
    condition: usize,
    value: &toml::Value,
) -> Result<QueryCondition, ConfigError> {
    match value {
        toml::Value::String(key) => Ok(QueryCondition::key(key.as_str())),
        toml::Value::Array(pair) => match pair.as_slice() {
            [toml::Value::String(key), toml::Value::String(pattern)] => {
                Ok(QueryCondition::matching(key.as_str(), pattern.as_str()))
            }
            _ => Err(shape_error(
                group,
                condition,
                "expected a [key, pattern] pair of strings",
            )),
        },
        other => Err(shape_error(
            group,
            condition,
            &format!("expected a key or a [key, pattern] pair, got {}", other.type_str()),
        )),
    }
}

fn shape_error(group: usize, condition: usize, message: &str) -> ConfigError {
    ConfigError::InvalidQueryCondition {
        group,
        condition,
        message: message.to_string(),
    }
}
