//! Point features from both sides of a conflation pass.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{DatasetId, FeatureDataError, OsmId};

/// Tag set of a feature. Ordered so that merged output is deterministic.
pub type Tags = BTreeMap<String, String>;

/// WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl Position {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Checks that both coordinates are finite and within WGS84 range.
    pub fn validate(&self) -> Result<(), FeatureDataError> {
        if !self.lat.is_finite() || !self.lon.is_finite() {
            return Err(FeatureDataError::NonFiniteCoordinate {
                lat: self.lat,
                lon: self.lon,
            });
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(FeatureDataError::LatitudeOutOfRange(self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(FeatureDataError::LongitudeOutOfRange(self.lon));
        }
        Ok(())
    }
}

/// A point feature with an external identifier and a tag set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature<I> {
    pub id: I,
    pub position: Position,
    #[serde(default)]
    pub tags: Tags,
}

/// Feature from the authoritative source dataset.
pub type DatasetFeature = Feature<DatasetId>;

/// Feature from existing map data.
pub type OsmFeature = Feature<OsmId>;

impl<I> Feature<I> {
    pub fn new(id: I, position: Position) -> Self {
        Self {
            id,
            position,
            tags: Tags::new(),
        }
    }

    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Position and tag checks applied before a feature enters matching.
    pub fn validate(&self) -> Result<(), FeatureDataError> {
        self.position.validate()?;
        if self.tags.keys().any(|key| key.is_empty()) {
            return Err(FeatureDataError::EmptyTagKey);
        }
        Ok(())
    }
}
