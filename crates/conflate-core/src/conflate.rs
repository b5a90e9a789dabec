use tracing::{info, info_span};

use conflate_match::Matcher;
use conflate_model::{
    Action, ConfigError, DatasetFeature, DatasetState, MatchResult, OsmFeature, Profile,
};
use conflate_query::Predicate;

use crate::actions::plan_actions;
use crate::report::ConflationReport;

/// Everything one pass produced.
#[derive(Debug, Clone)]
pub struct Conflation {
    /// Final state per dataset feature, parallel to the dataset input.
    pub states: Vec<DatasetState>,
    pub results: Vec<MatchResult>,
    pub actions: Vec<Action>,
    pub report: ConflationReport,
}

/// Runs one conflation pass over in-memory features.
///
/// Only an invalid profile is an error. Malformed features are skipped and
/// reported through [`ConflationReport::diagnostics`].
pub fn conflate(
    profile: &Profile,
    dataset: &[DatasetFeature],
    osm: &[OsmFeature],
) -> Result<Conflation, ConfigError> {
    profile.validate()?;
    let predicate = Predicate::compile(&profile.query)?;

    let span = info_span!("conflate", dataset = dataset.len(), osm = osm.len());
    let _guard = span.enter();

    let outcome = Matcher::new(profile, &predicate).run(dataset, osm);
    let plan = plan_actions(profile, dataset, osm, &outcome);
    let report = ConflationReport::new(dataset.len(), osm.len(), &outcome, &plan);
    info!(
        created = report.created,
        updated = report.updated,
        deleted = report.deleted,
        unchanged = report.unchanged,
        diagnostics = report.diagnostics.len(),
        "conflation pass complete"
    );

    Ok(Conflation {
        results: outcome.results(dataset, osm),
        states: outcome.dataset_states,
        actions: plan.actions,
        report,
    })
}
