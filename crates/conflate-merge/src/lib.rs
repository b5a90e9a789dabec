//! Tag merging for conflation.
//!
//! - **merge**: final tags for matched pairs, created features and orphans
//! - **builtins**: compute functions shipped with the tool

#![deny(unsafe_code)]

pub mod builtins;
pub mod merge;

pub use builtins::default_registry;
pub use merge::{apply_transforms, create_tags, merge, tag_orphan};
