use thiserror::Error;

/// Invalid profile configuration. Always fatal, raised before any matching.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be a finite, non-negative distance in meters (got {value})")]
    InvalidDistance { field: &'static str, value: f64 },

    #[error("max_distance ({max}) must not be smaller than duplicate_distance ({duplicate})")]
    DistanceOrder { max: f64, duplicate: f64 },

    #[error("dataset_id is required unless no_dataset_id is set")]
    MissingDatasetId,

    #[error("dataset_id '{0}' conflicts with no_dataset_id = true")]
    UnexpectedDatasetId(String),

    #[error("invalid dataset_id '{0}': must be non-empty and contain no whitespace")]
    InvalidDatasetId(String),

    #[error("query must contain at least one group")]
    EmptyQuery,

    #[error("query group {group} has no conditions")]
    EmptyQueryGroup { group: usize },

    #[error("query group {group}, condition {condition}: {message}")]
    InvalidQueryCondition {
        group: usize,
        condition: usize,
        message: String,
    },

    #[error("invalid pattern '{pattern}' for key '{key}': {message}")]
    InvalidPattern {
        key: String,
        pattern: String,
        message: String,
    },

    #[error("master_tags contains an empty key")]
    EmptyMasterTag,

    #[error("master_tags lists '{0}' more than once")]
    DuplicateMasterTag(String),

    #[error("transform entry {index}: {message}")]
    InvalidTransform { index: usize, message: String },

    #[error("transform entry {index} references unknown compute function '{name}'")]
    UnknownComputeFunction { index: usize, name: String },

    #[error("tag_unmatched contains an empty key")]
    EmptyUnmatchedTag,

    #[error("overpass_timeout must be positive")]
    InvalidTimeout,

    #[error("invalid bbox: {0}")]
    InvalidBoundingBox(String),
}

/// Problem with a single input feature. Recorded as a diagnostic; the feature is skipped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureDataError {
    #[error("coordinate is not a finite number (lat {lat}, lon {lon})")]
    NonFiniteCoordinate { lat: f64, lon: f64 },

    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("tag with an empty key")]
    EmptyTagKey,

    #[error("identifier appears more than once in the input")]
    DuplicateId,

    #[error("invalid identifier '{0}'")]
    InvalidId(String),

    #[error("feature has no identifier")]
    MissingId,

    #[error("feature has no usable geometry")]
    MissingGeometry,
}
