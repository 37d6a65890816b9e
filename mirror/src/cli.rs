//! CLI argument definitions for the chart mirror.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::error::ConfigError;
use crate::settings::{MirrorRequest, MirrorSettings, SettingsFile};
use camino::Utf8PathBuf;
use clap::Parser;

/// Mirror a chart repository to local storage.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "chartmirror")]
#[command(version, about)]
#[command(long_about = concat!(
    "Mirror a chart repository to local storage.\n\n",
    "Downloads the repository's index.yaml, selects the charts to mirror, fetches ",
    "their archives into <DEST_ROOT>/<TARGET_DIR>, and publishes the index next to ",
    "them. The index is renamed into place only after every archive has been ",
    "handled, so an interrupted run never leaves a half-written index behind.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Mirror the newest version of every chart:\n",
    "    $ chartmirror https://charts.example.com demo\n\n",
    "  Mirror every version of one chart, skipping broken archives:\n",
    "    $ chartmirror -c app -a -i https://charts.example.com demo\n\n",
    "  Serve the mirror from a different host:\n",
    "    $ chartmirror --new-root-url https://mirror.internal/demo https://charts.example.com demo\n\n",
    "  Preview without downloading archives:\n",
    "    $ chartmirror --dry-run https://charts.example.com demo",
))]
pub struct Cli {
    /// Base URL of the chart repository to mirror.
    #[arg(value_name = "SOURCE_URL")]
    pub source_url: String,

    /// Name of the local mirror directory.
    #[arg(value_name = "TARGET_DIR")]
    pub target_dir: String,

    /// Directory the mirror directory is created in.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub dest_root: Utf8PathBuf,

    /// Mirror only charts with this name.
    #[arg(short = 'c', long, value_name = "NAME")]
    pub chart_name: Option<String>,

    /// Mirror only this chart version.
    #[arg(long, value_name = "VERSION")]
    pub chart_version: Option<String>,

    /// Mirror every version instead of only the newest.
    #[arg(short, long)]
    pub all_versions: bool,

    /// Replace the source URL with this one in the published index.
    #[arg(long, value_name = "URL")]
    pub new_root_url: Option<String>,

    /// Skip archives that fail instead of aborting.
    #[arg(short, long)]
    pub ignore_errors: bool,

    /// TOML settings file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Network timeout in seconds [default: 30].
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Show the archives that would be mirrored and exit.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (warnings and errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// The run request described by the flags alone.
    #[must_use]
    pub fn request(&self) -> MirrorRequest {
        MirrorRequest {
            source_url: self.source_url.clone(),
            identifier: self.target_dir.clone(),
            dest_root: self.dest_root.clone(),
            chart_name: self.chart_name.clone(),
            chart_version: self.chart_version.clone(),
            all_versions: self.all_versions,
            new_root_url: self.new_root_url.clone(),
            ignore_errors: self.ignore_errors,
            timeout_secs: self.timeout,
            quiet: self.quiet,
        }
    }

    /// Load the settings file, if any, and merge it with the flags.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the settings file cannot be loaded or
    /// the merged settings are invalid.
    pub fn settings(&self) -> Result<MirrorSettings, ConfigError> {
        let file = match &self.config {
            Some(path) => SettingsFile::load(path)?,
            None => SettingsFile::default(),
        };
        self.request().resolve(&file)
    }

    /// Log level filter for the requested verbosity.
    ///
    /// # Examples
    ///
    /// ```
    /// use chartmirror::cli::Cli;
    /// use clap::Parser;
    ///
    /// let cli = Cli::parse_from(["chartmirror", "-vv", "https://repo.example", "demo"]);
    /// assert_eq!(cli.log_level(), log::LevelFilter::Debug);
    /// ```
    #[must_use]
    pub const fn log_level(&self) -> log::LevelFilter {
        match self.verbosity {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
