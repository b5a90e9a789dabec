//! Conflation profile: the read-only configuration of one run.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Tags, TransformEntry, TransformRule};

/// Default radius for matching dataset features to OSM features, in meters.
pub const DEFAULT_MAX_DISTANCE: f64 = 100.0;
/// Default radius for dataset duplicate detection, in meters.
pub const DEFAULT_DUPLICATE_DISTANCE: f64 = 0.0;
/// Default Overpass request timeout, in seconds.
pub const DEFAULT_OVERPASS_TIMEOUT: u32 = 120;

/// A single tag condition. Without a pattern it only requires the key to be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryCondition {
    pub key: String,
    pub value_pattern: Option<String>,
}

impl QueryCondition {
    /// Condition satisfied by any value of `key`.
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value_pattern: None,
        }
    }

    /// Condition satisfied when the value of `key` matches `pattern`.
    pub fn matching(key: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value_pattern: Some(pattern.into()),
        }
    }
}

/// Conditions combined with AND. Groups of a profile are combined with OR.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryGroup {
    pub conditions: Vec<QueryCondition>,
}

impl QueryGroup {
    pub fn new(conditions: Vec<QueryCondition>) -> Self {
        Self { conditions }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QueryCondition> {
        self.conditions.iter()
    }
}

/// Region filter for the OSM provider, in Overpass order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let values = [self.south, self.west, self.north, self.east];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::InvalidBoundingBox(
                "coordinates must be finite".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&self.south) || !(-90.0..=90.0).contains(&self.north) {
            return Err(ConfigError::InvalidBoundingBox(
                "latitudes must be within [-90, 90]".to_string(),
            ));
        }
        if !(-180.0..=180.0).contains(&self.west) || !(-180.0..=180.0).contains(&self.east) {
            return Err(ConfigError::InvalidBoundingBox(
                "longitudes must be within [-180, 180]".to_string(),
            ));
        }
        if self.south > self.north {
            return Err(ConfigError::InvalidBoundingBox(format!(
                "south ({}) is north of north ({})",
                self.south, self.north
            )));
        }
        Ok(())
    }
}

/// Configuration consumed by every stage of a conflation pass.
///
/// A profile is validated once (see [`Profile::validate`]) and then treated
/// as read-only. Components receive it by reference.
#[derive(Debug, Clone)]
pub struct Profile {
    /// Value of the `source` tag written on touched features.
    pub source: Option<String>,
    /// Whether the `source` tag is written at all.
    pub add_source: bool,
    /// Namespace of the `ref:<dataset_id>` cross-reference tag.
    pub dataset_id: Option<String>,
    /// Rely on geometry only; no reference tag is written or read.
    pub no_dataset_id: bool,
    pub query: Vec<QueryGroup>,
    /// Keys for which the dataset is authoritative, in declaration order.
    pub master_tags: Vec<String>,
    pub delete_unmatched: bool,
    /// Tags added to orphans when they are not deleted.
    pub tag_unmatched: Tags,
    pub max_distance: f64,
    pub duplicate_distance: f64,
    pub transform: Vec<TransformEntry>,
    pub bounded_update: bool,
    pub overpass_timeout: u32,
    pub bbox: Option<BoundingBox>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            source: None,
            add_source: true,
            dataset_id: None,
            no_dataset_id: true,
            query: Vec::new(),
            master_tags: Vec::new(),
            delete_unmatched: false,
            tag_unmatched: Tags::new(),
            max_distance: DEFAULT_MAX_DISTANCE,
            duplicate_distance: DEFAULT_DUPLICATE_DISTANCE,
            transform: Vec::new(),
            bounded_update: false,
            overpass_timeout: DEFAULT_OVERPASS_TIMEOUT,
            bbox: None,
        }
    }
}

impl Profile {
    /// Key of the cross-reference tag, e.g. `ref:gurs:hs_mid`.
    pub fn reference_tag(&self) -> Option<String> {
        if self.no_dataset_id {
            return None;
        }
        self.dataset_id.as_deref().map(|id| format!("ref:{id}"))
    }

    /// Source tag value, if one should be written.
    pub fn source_tag(&self) -> Option<&str> {
        if !self.add_source {
            return None;
        }
        self.source.as_deref().filter(|s| !s.is_empty())
    }

    /// Checks every structural invariant of the profile.
    ///
    /// Pattern syntax is checked separately when the query is compiled.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_distance("max_distance", self.max_distance)?;
        validate_distance("duplicate_distance", self.duplicate_distance)?;
        if self.max_distance < self.duplicate_distance {
            return Err(ConfigError::DistanceOrder {
                max: self.max_distance,
                duplicate: self.duplicate_distance,
            });
        }

        match (&self.dataset_id, self.no_dataset_id) {
            (None, false) => return Err(ConfigError::MissingDatasetId),
            (Some(id), true) => return Err(ConfigError::UnexpectedDatasetId(id.clone())),
            (Some(id), false) if id.is_empty() || id.chars().any(char::is_whitespace) => {
                return Err(ConfigError::InvalidDatasetId(id.clone()));
            }
            _ => {}
        }

        self.validate_query()?;

        let mut seen = BTreeSet::new();
        for key in &self.master_tags {
            if key.is_empty() {
                return Err(ConfigError::EmptyMasterTag);
            }
            if !seen.insert(key.as_str()) {
                return Err(ConfigError::DuplicateMasterTag(key.clone()));
            }
        }

        for (index, entry) in self.transform.iter().enumerate() {
            validate_transform(index, entry)?;
        }

        if self.tag_unmatched.keys().any(String::is_empty) {
            return Err(ConfigError::EmptyUnmatchedTag);
        }
        if self.overpass_timeout == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        if let Some(bbox) = &self.bbox {
            bbox.validate()?;
        }
        Ok(())
    }

    fn validate_query(&self) -> Result<(), ConfigError> {
        if self.query.is_empty() {
            return Err(ConfigError::EmptyQuery);
        }
        for (group_idx, group) in self.query.iter().enumerate() {
            if group.conditions.is_empty() {
                return Err(ConfigError::EmptyQueryGroup { group: group_idx });
            }
            for (cond_idx, condition) in group.iter().enumerate() {
                if condition.key.trim().is_empty() {
                    return Err(ConfigError::InvalidQueryCondition {
                        group: group_idx,
                        condition: cond_idx,
                        message: "key must not be empty".to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn validate_distance(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidDistance { field, value });
    }
    Ok(())
}

fn validate_transform(index: usize, entry: &TransformEntry) -> Result<(), ConfigError> {
    let invalid = |message: &str| ConfigError::InvalidTransform {
        index,
        message: message.to_string(),
    };
    if entry.key.is_empty() {
        return Err(invalid("key must not be empty"));
    }
    if let TransformRule::Rename(target) = &entry.rule {
        if target.is_empty() {
            return Err(invalid("rename target must not be empty"));
        }
        if target == &entry.key {
            return Err(invalid("rename target equals the source key"));
        }
    }
    Ok(())
}
