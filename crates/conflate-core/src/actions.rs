//! Edit actions for the changeset writer.

use tracing::debug;

use conflate_match::MatchOutcome;
use conflate_merge::{create_tags, merge, tag_orphan};
use conflate_model::{Action, DatasetFeature, OsmFeature, Profile};

/// Actions of one pass and the number of matched features left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionPlan {
    /// Updates for matched features, then creates, then orphan handling.
    /// Each group follows input order.
    pub actions: Vec<Action>,
    /// Matched features whose merged tags equal the existing ones.
    pub unchanged: usize,
}

pub fn plan_actions(
    profile: &Profile,
    dataset: &[DatasetFeature],
    osm: &[OsmFeature],
    outcome: &MatchOutcome,
) -> ActionPlan {
    let mut plan = ActionPlan::default();

    for pair in &outcome.matches {
        let existing = &osm[pair.osm];
        let tags = merge(&dataset[pair.dataset], existing, profile);
        if tags == existing.tags {
            debug!(osm_id = %existing.id, "merged tags unchanged");
            plan.unchanged += 1;
            continue;
        }
        plan.actions.push(Action::Update {
            osm_id: existing.id,
            tags,
        });
    }

    for &idx in &outcome.unmatched {
        let feature = &dataset[idx];
        plan.actions.push(Action::Create {
            position: feature.position,
            tags: create_tags(feature, profile),
        });
    }

    for &idx in &outcome.orphans {
        let orphan = &osm[idx];
        if profile.delete_unmatched {
            plan.actions.push(Action::Delete { osm_id: orphan.id });
        } else if let Some(tags) = tag_orphan(orphan, profile) {
            plan.actions.push(Action::Update {
                osm_id: orphan.id,
                tags,
            });
        }
    }

    plan
}
