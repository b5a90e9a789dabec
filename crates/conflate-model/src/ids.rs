#![deny(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use crate::FeatureDataError;

/// Identifier of a record in the source dataset (e.g. an address registry key).
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct DatasetId(String);

impl DatasetId {
    pub fn new(value: impl Into<String>) -> Result<Self, FeatureDataError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(FeatureDataError::InvalidId(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// OSM element type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "n" | "node" => Some(Self::Node),
            "w" | "way" => Some(Self::Way),
            "r" | "relation" => Some(Self::Relation),
            _ => None,
        }
    }
}

/// Identifier of an existing OSM element.
///
/// Ordering is by element kind, then numeric id. The matcher relies on this
/// order to break distance ties deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OsmId {
    pub kind: ElementKind,
    pub id: i64,
}

impl OsmId {
    pub fn new(kind: ElementKind, id: i64) -> Self {
        Self { kind, id }
    }

    pub fn node(id: i64) -> Self {
        Self::new(ElementKind::Node, id)
    }

    pub fn way(id: i64) -> Self {
        Self::new(ElementKind::Way, id)
    }

    pub fn relation(id: i64) -> Self {
        Self::new(ElementKind::Relation, id)
    }
}

impl FromStr for OsmId {
    type Err = FeatureDataError;

    /// Accepts `node/123`, `way/5`, `relation/7` and the short `n123`, `w5`, `r7` forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let invalid = || FeatureDataError::InvalidId(s.to_string());
        let (kind, number) = match raw.split_once('/') {
            Some((kind, number)) => (kind, number),
            None => {
                let split = raw
                    .char_indices()
                    .find(|(_, c)| c.is_ascii_digit() || *c == '-')
                    .map(|(idx, _)| idx)
                    .ok_or_else(invalid)?;
                raw.split_at(split)
            }
        };
        let kind = ElementKind::parse(kind).ok_or_else(invalid)?;
        let id = number.parse::<i64>().map_err(|_| invalid())?;
        Ok(Self { kind, id })
    }
}

impl fmt::Display for OsmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind.as_str(), self.id)
    }
}

impl serde::Serialize for OsmId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for OsmId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
