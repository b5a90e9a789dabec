//! TOML conflation profiles.
//!
//! A profile file is read into a raw serde schema, converted into a
//! [`conflate_model::Profile`] (resolving compute function names against a
//! registry) and validated, including compilation of every query pattern.

#![deny(unsafe_code)]

pub mod error;
pub mod loader;
mod schema;

pub use crate::error::ProfileError;
pub use crate::loader::{load_profile, parse_profile};
