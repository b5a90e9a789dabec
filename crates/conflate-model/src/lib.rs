pub mod diagnostic;
pub mod error;
pub mod feature;
pub mod ids;
pub mod outcome;
pub mod profile;
pub mod transform;

pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use error::{ConfigError, FeatureDataError};
pub use feature::{DatasetFeature, Feature, OsmFeature, Position, Tags};
pub use ids::{DatasetId, ElementKind, OsmId};
pub use outcome::{Action, ActionKind, DatasetState, MatchMethod, MatchResult};
pub use profile::{
    BoundingBox, DEFAULT_DUPLICATE_DISTANCE, DEFAULT_MAX_DISTANCE, DEFAULT_OVERPASS_TIMEOUT,
    Profile, QueryCondition, QueryGroup,
};
pub use transform::{ComputeFn, ComputeRegistry, TransformEntry, TransformRule};
