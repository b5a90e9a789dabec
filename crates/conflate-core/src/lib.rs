//! Conflation pass orchestration.
//!
//! - **conflate**: validate, match, merge and plan actions for one pass
//! - **actions**: edit actions from a match outcome
//! - **report**: per-pass counts and diagnostics
//! - **pipeline**: collaborator traits around a pass (importer, provider, writer)

#![deny(unsafe_code)]

pub mod actions;
pub mod conflate;
pub mod pipeline;
pub mod report;

pub use actions::{ActionPlan, plan_actions};
pub use conflate::{Conflation, conflate};
pub use pipeline::{
    ChangesetWriter, DatasetImporter, Imported, OsmProvider, conflate_sources, run_pipeline,
};
pub use report::ConflationReport;
