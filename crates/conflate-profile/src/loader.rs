use std::fs;
use std::path::Path;

use tracing::{debug, info};

use conflate_model::{ComputeRegistry, Profile};
use conflate_query::Predicate;

use crate::error::ProfileError;
use crate::schema::RawProfile;

/// Reads, converts and validates the profile at `path`.
pub fn load_profile(path: &Path, registry: &ComputeRegistry) -> Result<Profile, ProfileError> {
    let contents = fs::read_to_string(path).map_err(|e| ProfileError::io(path, e))?;
    let raw: RawProfile = toml::from_str(&contents).map_err(|e| ProfileError::Toml {
        path: path.to_path_buf(),
        source: e,
    })?;
    let profile = finish(raw, registry)?;
    info!(
        path = %path.display(),
        groups = profile.query.len(),
        master_tags = profile.master_tags.len(),
        transforms = profile.transform.len(),
        "profile loaded"
    );
    Ok(profile)
}

/// Same as [`load_profile`] for an in-memory document.
pub fn parse_profile(contents: &str, registry: &ComputeRegistry) -> Result<Profile, ProfileError> {
    let raw: RawProfile = toml::from_str(contents).map_err(ProfileError::Syntax)?;
    finish(raw, registry)
}

fn finish(raw: RawProfile, registry: &ComputeRegistry) -> Result<Profile, ProfileError> {
    let profile = raw.into_profile(registry)?;
    profile.validate()?;
    let predicate = Predicate::compile(&profile.query)?;
    debug!(groups = predicate.group_count(), "query patterns compiled");
    Ok(profile)
}
