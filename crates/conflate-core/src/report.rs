use serde::Serialize;

use conflate_match::MatchOutcome;
use conflate_model::{ActionKind, Diagnostic, MatchMethod};

use crate::actions::ActionPlan;

/// Summary of one conflation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConflationReport {
    pub dataset_features: usize,
    pub osm_features: usize,
    pub skipped_dataset: usize,
    pub skipped_osm: usize,
    pub duplicates: usize,
    pub matched_by_reference: usize,
    pub matched_by_distance: usize,
    pub unmatched: usize,
    pub orphans: usize,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl ConflationReport {
    pub fn new(
        dataset_features: usize,
        osm_features: usize,
        outcome: &MatchOutcome,
        plan: &ActionPlan,
    ) -> Self {
        let by_method = |method: MatchMethod| {
            outcome
                .matches
                .iter()
                .filter(|pair| pair.method == method)
                .count()
        };
        let by_kind = |kind: ActionKind| {
            plan.actions
                .iter()
                .filter(|action| action.kind() == kind)
                .count()
        };
        Self {
            dataset_features,
            osm_features,
            skipped_dataset: outcome.skipped_dataset.len(),
            skipped_osm: outcome.skipped_osm.len(),
            duplicates: outcome.duplicates.len(),
            matched_by_reference: by_method(MatchMethod::Reference),
            matched_by_distance: by_method(MatchMethod::Distance),
            unmatched: outcome.unmatched.len(),
            orphans: outcome.orphans.len(),
            created: by_kind(ActionKind::Create),
            updated: by_kind(ActionKind::Update),
            deleted: by_kind(ActionKind::Delete),
            unchanged: plan.unchanged,
            diagnostics: outcome.diagnostics.clone(),
        }
    }

    /// Counts records an importer or provider dropped before the pass as
    /// skipped input, and lists their diagnostics first.
    pub fn record_dropped(&mut self, dataset: &[Diagnostic], osm: &[Diagnostic]) {
        self.dataset_features += dataset.len();
        self.skipped_dataset += dataset.len();
        self.osm_features += osm.len();
        self.skipped_osm += osm.len();
        let pass = std::mem::take(&mut self.diagnostics);
        self.diagnostics = dataset.iter().chain(osm).cloned().chain(pass).collect();
    }

    pub fn matched(&self) -> usize {
        self.matched_by_reference + self.matched_by_distance
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

