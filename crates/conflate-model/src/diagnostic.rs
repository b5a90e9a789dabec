use serde::{Deserialize, Serialize};

use crate::FeatureDataError;

/// Category of a non-fatal problem found during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A feature was skipped because of malformed data.
    FeatureData,
    /// Two OSM candidates were equidistant; resolved by tie-break.
    AmbiguousMatch,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FeatureData => "feature_data",
            Self::AmbiguousMatch => "ambiguous_match",
        }
    }
}

/// A recorded, non-fatal issue about one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Identifier of the affected feature (`dataset:<id>` or `node/<id>` ...).
    pub subject: String,
    pub message: String,
}

impl Diagnostic {
    pub fn feature_data(subject: impl Into<String>, error: &FeatureDataError) -> Self {
        Self {
            kind: DiagnosticKind::FeatureData,
            subject: subject.into(),
            message: error.to_string(),
        }
    }

    pub fn ambiguous_match(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::AmbiguousMatch,
            subject: subject.into(),
            message: message.into(),
        }
    }
}
