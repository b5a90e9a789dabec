//! Candidate selection for conflation.
//!
//! - **predicate**: compiled OR-of-AND tag queries
//! - **overpass**: Overpass QL text for the external OSM provider

pub mod overpass;
pub mod predicate;

pub use overpass::render_query;
pub use predicate::{Predicate, evaluate};
