//! Duplicate detection and dataset-to-OSM matching.

#![deny(unsafe_code)]

mod engine;
mod types;

pub use engine::Matcher;
pub use types::{EQUIDISTANCE_TOLERANCE_M, MatchOutcome, MatchedPair};
