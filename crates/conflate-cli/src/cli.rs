//! CLI argument definitions for the conflation tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "conflate",
    version,
    about = "Profile-driven conflation of point datasets with OpenStreetMap",
    long_about = "Match an authoritative point dataset (e.g. an address registry) against\n\
                  existing OpenStreetMap features and plan the resulting edits.\n\n\
                  Behaviour is configured by a TOML profile: query, master tags,\n\
                  distance thresholds and tag transforms."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate a profile and print its settings.
    Check(ProfileArgs),

    /// Print the Overpass QL query that fetches candidates for a profile.
    Query(ProfileArgs),

    /// Run one conflation pass over GeoJSON inputs.
    Run(RunArgs),
}

#[derive(Parser)]
pub struct ProfileArgs {
    /// Path to the TOML profile.
    #[arg(value_name = "PROFILE")]
    pub profile: PathBuf,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Path to the TOML profile.
    #[arg(value_name = "PROFILE")]
    pub profile: PathBuf,

    /// GeoJSON FeatureCollection with the source dataset.
    #[arg(long = "dataset", value_name = "GEOJSON")]
    pub dataset: PathBuf,

    /// GeoJSON FeatureCollection with existing OSM features (e.g. an Overpass export).
    #[arg(long = "osm", value_name = "GEOJSON")]
    pub osm: PathBuf,

    /// Where to write the planned actions as JSON (default: stdout).
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Match and report without writing any actions.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
