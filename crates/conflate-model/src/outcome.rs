//! Results of matching and the actions handed to the changeset writer.

use serde::{Deserialize, Serialize};

use crate::{DatasetId, OsmId, Position, Tags};

/// How a matched pair was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    /// The OSM feature already carried the dataset reference tag.
    Reference,
    /// Nearest free OSM feature within `max_distance`.
    Distance,
}

/// Final state of a dataset feature after the matcher ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DatasetState {
    Unprocessed,
    /// Dropped before matching because of malformed data.
    Skipped,
    DuplicateOf { canonical: DatasetId },
    Matched { osm_id: OsmId },
    Unmatched,
}

impl DatasetState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Unprocessed)
    }
}

/// Match outcome; each feature appears in at most one variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum MatchResult {
    Matched {
        dataset_id: DatasetId,
        osm_id: OsmId,
        method: MatchMethod,
        distance_m: f64,
    },
    Unmatched {
        dataset_id: DatasetId,
    },
    Orphan {
        osm_id: OsmId,
    },
}

/// Edit for the external changeset writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Create { position: Position, tags: Tags },
    Update { osm_id: OsmId, tags: Tags },
    Delete { osm_id: OsmId },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Create { .. } => ActionKind::Create,
            Self::Update { .. } => ActionKind::Update,
            Self::Delete { .. } => ActionKind::Delete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}
