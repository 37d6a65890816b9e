//! Run settings and the optional TOML settings file.
//!
//! A run is described by a [`MirrorRequest`] (what the caller typed) merged
//! with a [`SettingsFile`] (what the operator configured once). Explicit
//! request values win over the file, and the file wins over built-in
//! defaults. The merged result is a validated [`MirrorSettings`].

use crate::error::ConfigError;
use crate::policy::ErrorPolicy;
use crate::repository::RepositoryConfig;
use crate::selector::SelectionCriteria;
use crate::transport::DEFAULT_TIMEOUT;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::time::Duration;

/// Settings read from a TOML file.
///
/// Every field is optional; unknown keys are rejected so typos surface
/// instead of being silently ignored.
///
/// ```toml
/// ignore_errors = true
/// new_root_url = "https://mirror.internal/charts"
/// timeout_secs = 60
/// all_versions = false
/// ```
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    /// Skip failing archives instead of aborting.
    pub ignore_errors: bool,
    /// Base URL written into the published index.
    pub new_root_url: Option<String>,
    /// Global HTTP timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Mirror every version rather than only the newest.
    pub all_versions: bool,
}

impl SettingsFile {
    /// Load settings from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SettingsRead`] if the file cannot be read and
    /// [`ConfigError::SettingsParse`] if it is not valid settings TOML.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::SettingsRead {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::SettingsParse {
            path: path.to_owned(),
            source,
        })
    }
}

/// Everything the caller supplied for one run, before validation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MirrorRequest {
    /// Remote repository base URL.
    pub source_url: String,
    /// Local mirror directory name.
    pub identifier: String,
    /// Directory the mirror directory is created in.
    pub dest_root: Utf8PathBuf,
    /// Package name filter.
    pub chart_name: Option<String>,
    /// Exact version pin.
    pub chart_version: Option<String>,
    /// Mirror every version.
    pub all_versions: bool,
    /// Base URL written into the published index.
    pub new_root_url: Option<String>,
    /// Skip failing archives instead of aborting.
    pub ignore_errors: bool,
    /// Global HTTP timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Suppress progress lines.
    pub quiet: bool,
}

impl MirrorRequest {
    /// Merge with `file` and validate.
    ///
    /// Flags can only switch behaviour on, so a flag set on either side is
    /// set in the result. Valued options fall back to the file when absent.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the repository description is invalid or
    /// the timeout is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use chartmirror::settings::{MirrorRequest, SettingsFile};
    ///
    /// let request = MirrorRequest {
    ///     source_url: "https://repo.example/charts".to_owned(),
    ///     identifier: "demo".to_owned(),
    ///     dest_root: ".".into(),
    ///     ..MirrorRequest::default()
    /// };
    /// let file = SettingsFile {
    ///     ignore_errors: true,
    ///     ..SettingsFile::default()
    /// };
    ///
    /// let settings = request.resolve(&file).expect("valid settings");
    /// assert!(settings.policy.is_tolerant());
    /// ```
    pub fn resolve(self, file: &SettingsFile) -> Result<MirrorSettings, ConfigError> {
        let new_root_url = self.new_root_url.or_else(|| file.new_root_url.clone());
        let repository = RepositoryConfig::new(self.identifier, self.source_url, new_root_url)?;

        let timeout = match self.timeout_secs.or(file.timeout_secs) {
            Some(0) => return Err(ConfigError::ZeroTimeout),
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_TIMEOUT,
        };

        let criteria = SelectionCriteria::from_filters(
            self.chart_name.as_deref(),
            self.chart_version.as_deref(),
            self.all_versions || file.all_versions,
        );

        Ok(MirrorSettings {
            repository,
            dest_root: self.dest_root,
            criteria,
            policy: ErrorPolicy::from_ignore_errors(self.ignore_errors || file.ignore_errors),
            timeout,
            quiet: self.quiet,
        })
    }
}

/// Validated configuration of one mirror run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MirrorSettings {
    /// Repository being mirrored.
    pub repository: RepositoryConfig,
    /// Directory the mirror directory is created in.
    pub dest_root: Utf8PathBuf,
    /// Which packages to mirror.
    pub criteria: SelectionCriteria,
    /// How recoverable failures are handled.
    pub policy: ErrorPolicy,
    /// Global HTTP timeout.
    pub timeout: Duration,
    /// Suppress progress lines.
    pub quiet: bool,
}
