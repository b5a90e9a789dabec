//! Final tag sets.
//!
//! The dataset is authoritative only for the profile's master tags; every
//! other existing OSM tag is carried over untouched. Transforms run in profile
//! order after the master tags, and the reference and source tags are written
//! last so that transforms cannot remove them.

use tracing::trace;

use conflate_model::{DatasetFeature, OsmFeature, Profile, Tags, TransformEntry, TransformRule};

/// Final tags for a matched pair.
///
/// A master tag whose dataset value is empty is removed from the result.
pub fn merge(dataset: &DatasetFeature, osm: &OsmFeature, profile: &Profile) -> Tags {
    let mut tags = osm.tags.clone();
    for key in &profile.master_tags {
        match dataset.tags.get(key) {
            Some(value) if value.is_empty() => {
                tags.remove(key);
            }
            Some(value) => {
                tags.insert(key.clone(), value.clone());
            }
            None => {}
        }
    }
    apply_transforms(&mut tags, &profile.transform);
    add_profile_tags(&mut tags, dataset, profile);
    tags
}

/// Tags for a new feature created from an unmatched dataset feature.
///
/// All dataset tags are used, empty values dropped.
pub fn create_tags(dataset: &DatasetFeature, profile: &Profile) -> Tags {
    let mut tags: Tags = dataset
        .tags
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    apply_transforms(&mut tags, &profile.transform);
    add_profile_tags(&mut tags, dataset, profile);
    tags
}

/// Tags for an orphan annotated with `tag_unmatched`, or `None` when the
/// profile has nothing to add or the tags are already present.
pub fn tag_orphan(osm: &OsmFeature, profile: &Profile) -> Option<Tags> {
    if profile.tag_unmatched.is_empty() {
        return None;
    }
    let mut tags = osm.tags.clone();
    for (key, value) in &profile.tag_unmatched {
        if value.is_empty() {
            tags.remove(key);
        } else {
            tags.insert(key.clone(), value.clone());
        }
    }
    (tags != osm.tags).then_some(tags)
}

/// Applies `entries` to `tags` in order.
///
/// A rule only fires when its key is present, except `Set` and `Compute`
/// which may introduce the key. A compute function returning `None` leaves the
/// tags unchanged; returning an empty string removes the key.
pub fn apply_transforms(tags: &mut Tags, entries: &[TransformEntry]) {
    for entry in entries {
        let key = entry.key.as_str();
        match &entry.rule {
            TransformRule::Rename(target) => {
                if target == key {
                    continue;
                }
                if let Some(value) = tags.remove(key) {
                    trace!(from = key, to = %target, "rename tag");
                    tags.insert(target.clone(), value);
                }
            }
            TransformRule::Remove => {
                if tags.remove(key).is_some() {
                    trace!(key, "remove tag");
                }
            }
            TransformRule::Set(value) => {
                tags.insert(key.to_string(), value.clone());
            }
            TransformRule::Compute(function) => match function.call(tags) {
                Some(value) if value.is_empty() => {
                    tags.remove(key);
                }
                Some(value) => {
                    trace!(key, function = function.name(), %value, "computed tag");
                    tags.insert(key.to_string(), value);
                }
                None => {}
            },
        }
    }
}

fn add_profile_tags(tags: &mut Tags, dataset: &DatasetFeature, profile: &Profile) {
    if let Some(reference) = profile.reference_tag() {
        tags.insert(reference, dataset.id.as_str().to_string());
    }
    if let Some(source) = profile.source_tag() {
        tags.insert("source".to_string(), source.to_string());
    }
}
