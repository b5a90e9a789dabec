use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use conflate_cli::features::{GeoJsonDataset, GeoJsonOsm, JsonChangesetWriter};
use conflate_core::{ConflationReport, conflate_sources, run_pipeline};
use conflate_merge::default_registry;
use conflate_model::Profile;
use conflate_profile::load_profile;
use conflate_query::render_query;

use crate::cli::{ProfileArgs, RunArgs};
use crate::summary::print_profile;

fn load(path: &Path) -> Result<Profile> {
    load_profile(path, &default_registry())
        .with_context(|| format!("load profile {}", path.display()))
}

pub fn run_check(args: &ProfileArgs) -> Result<()> {
    let profile = load(&args.profile)?;
    print_profile(&profile);
    Ok(())
}

pub fn run_query(args: &ProfileArgs) -> Result<()> {
    let profile = load(&args.profile)?;
    println!("{}", render_query(&profile));
    Ok(())
}

pub fn run_conflate(args: &RunArgs) -> Result<ConflationReport> {
    let span = info_span!("run", profile = %args.profile.display());
    let _guard = span.enter();

    let profile = load(&args.profile)?;
    let importer = GeoJsonDataset::new(&args.dataset);
    let provider = GeoJsonOsm::new(&args.osm);

    if args.dry_run {
        let conflation = conflate_sources(&profile, &importer, &provider)?;
        info!(actions = conflation.actions.len(), "dry run, no actions written");
        return Ok(conflation.report);
    }

    let mut writer = JsonChangesetWriter::new(args.output.clone());
    let conflation = run_pipeline(&profile, &importer, &provider, &mut writer)?;
    if let Some(path) = &args.output {
        info!(path = %path.display(), actions = conflation.actions.len(), "actions written");
    }
    Ok(conflation.report)
}
