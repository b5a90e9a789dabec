//! Collaborators around a conflation pass.
//!
//! Loading features and writing the changeset happen strictly before and
//! after [`conflate`]; the pass itself never performs I/O.

use anyhow::{Context, Result};
use tracing::info;

use conflate_model::{Action, DatasetFeature, Diagnostic, OsmFeature, Profile};

use crate::conflate::{Conflation, conflate};

/// Features read from a source, plus one diagnostic per record that could
/// not be turned into a feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Imported<T> {
    pub features: Vec<T>,
    pub dropped: Vec<Diagnostic>,
}

impl<T> From<Vec<T>> for Imported<T> {
    fn from(features: Vec<T>) -> Self {
        Self {
            features,
            dropped: Vec::new(),
        }
    }
}

/// Supplies features from the authoritative source dataset.
pub trait DatasetImporter {
    fn import(&self) -> Result<Imported<DatasetFeature>>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// Supplies existing map features, typically pre-filtered by the profile query.
pub trait OsmProvider {
    fn fetch(&self, profile: &Profile) -> Result<Imported<OsmFeature>>;

    fn name(&self) -> &str;
}

/// Consumes the actions of a pass.
pub trait ChangesetWriter {
    fn write(&mut self, actions: &[Action]) -> Result<()>;
}

/// Imports both sides and runs one pass without writing anything.
///
/// Records dropped by the importer or provider are counted as skipped in the
/// report, ahead of the pass's own diagnostics.
pub fn conflate_sources(
    profile: &Profile,
    importer: &dyn DatasetImporter,
    provider: &dyn OsmProvider,
) -> Result<Conflation> {
    let dataset = importer
        .import()
        .with_context(|| format!("failed to import dataset from {}", importer.name()))?;
    info!(
        source = importer.name(),
        features = dataset.features.len(),
        dropped = dataset.dropped.len(),
        "dataset imported"
    );

    let osm = provider
        .fetch(profile)
        .with_context(|| format!("failed to fetch OSM features from {}", provider.name()))?;
    info!(
        source = provider.name(),
        features = osm.features.len(),
        dropped = osm.dropped.len(),
        "OSM features fetched"
    );

    let mut conflation =
        conflate(profile, &dataset.features, &osm.features).context("invalid profile")?;
    conflation
        .report
        .record_dropped(&dataset.dropped, &osm.dropped);
    Ok(conflation)
}

/// Imports both sides, runs one pass and hands the actions to `writer`.
pub fn run_pipeline(
    profile: &Profile,
    importer: &dyn DatasetImporter,
    provider: &dyn OsmProvider,
    writer: &mut dyn ChangesetWriter,
) -> Result<Conflation> {
    let conflation = conflate_sources(profile, importer, provider)?;
    writer
        .write(&conflation.actions)
        .context("failed to write changeset")?;
    Ok(conflation)
}
