//! Error types for the chart mirror.
//!
//! [`MirrorError`] classifies every pipeline failure into the categories the
//! [`crate::policy::ErrorPolicy`] reasons about: acquisition and selection
//! failures always end the run, archive and filesystem failures may be
//! skipped in tolerant mode, and publish failures are fatal except for the
//! rewrite write. [`ConfigError`] covers invalid input before a run starts.

use crate::catalog::PackageName;
use crate::layout::LayoutError;
use crate::manifest::ManifestParseError;
use crate::matcher::MatchError;
use crate::transport::TransportError;
use camino::Utf8PathBuf;
use std::fmt;
use thiserror::Error;

/// Errors that can occur while mirroring a repository.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// The index could not be downloaded, stored, or parsed.
    #[error("failed to acquire index from {url}: {cause}")]
    Acquisition {
        /// Index URL that was requested.
        url: String,
        /// What went wrong.
        #[source]
        cause: AcquisitionCause,
    },

    /// The matcher could not evaluate the selection pattern.
    #[error("package selection failed: {0}")]
    Selection(#[from] MatchError),

    /// An archive could not be located or fetched.
    #[error("archive {name}({version}) from {location} failed: {cause}")]
    Artifact {
        /// Package name of the failing entry.
        name: PackageName,
        /// Package version of the failing entry.
        version: String,
        /// Location as listed in the index.
        location: String,
        /// What went wrong.
        #[source]
        cause: ArtifactCause,
    },

    /// A directory or file under the mirror root could not be created.
    #[error("cannot {operation} {path}: {source}")]
    Filesystem {
        /// The operation that failed.
        operation: FsOperation,
        /// Path the operation targeted.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The index could not be rewritten or promoted to its canonical name.
    #[error("failed to publish index at {stage} step for {path}: {source}")]
    Publish {
        /// The publish step that failed.
        stage: PublishStage,
        /// Path the step targeted.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The run configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl MirrorError {
    /// Whether tolerant mode may skip this failure and continue.
    ///
    /// Only per-archive failures and the rewrite write are recoverable;
    /// without an index or a published result the run has no usable output.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Artifact { .. }
                | Self::Filesystem { .. }
                | Self::Publish {
                    stage: PublishStage::WriteRewrite,
                    ..
                }
        )
    }
}

/// Why index acquisition failed.
#[derive(Debug, Error)]
pub enum AcquisitionCause {
    /// The mirror directory could not be created.
    #[error("cannot create mirror directory {path}: {source}")]
    Destination {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The index download failed.
    #[error(transparent)]
    Fetch(#[from] TransportError),

    /// The downloaded index is not a valid repository index.
    #[error(transparent)]
    Parse(#[from] ManifestParseError),
}

/// Why a single archive could not be mirrored.
#[derive(Debug, Error)]
pub enum ArtifactCause {
    /// The index location is not a usable URL.
    #[error("invalid location: {0}")]
    Location(#[from] url::ParseError),

    /// The location would map outside the mirror root.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// The download failed.
    #[error(transparent)]
    Fetch(#[from] TransportError),
}

/// Filesystem operations performed for archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsOperation {
    /// Creating the parent directories of an archive.
    CreateDirectory,
    /// Writing archive bytes.
    WriteFile,
}

impl fmt::Display for FsOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateDirectory => f.write_str("create directory"),
            Self::WriteFile => f.write_str("write file"),
        }
    }
}

/// Steps of the publish phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStage {
    /// Reading the temporary index before rewriting locations.
    ReadForRewrite,
    /// Writing the rewritten temporary index.
    WriteRewrite,
    /// Renaming the temporary index to its canonical name.
    Rename,
}

impl fmt::Display for PublishStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadForRewrite => f.write_str("read"),
            Self::WriteRewrite => f.write_str("rewrite"),
            Self::Rename => f.write_str("rename"),
        }
    }
}

/// Errors in user-supplied configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The repository identifier is not a single plain directory name.
    #[error("repository identifier \"{identifier}\" must be a single directory name")]
    InvalidIdentifier {
        /// The rejected identifier.
        identifier: String,
    },

    /// The source URL cannot be parsed or used as a base.
    #[error("invalid source URL \"{url}\": {reason}")]
    InvalidSourceUrl {
        /// The rejected URL.
        url: String,
        /// Description of the parse failure.
        reason: String,
    },

    /// `--new-root-url` was given but empty.
    #[error("new root URL must not be blank")]
    BlankNewRootUrl,

    /// A request timeout of zero seconds was configured.
    #[error("timeout must be at least one second")]
    ZeroTimeout,

    /// The settings file could not be read.
    #[error("cannot read settings file {path}: {source}")]
    SettingsRead {
        /// Path of the settings file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML or has unknown fields.
    #[error("invalid settings file {path}: {source}")]
    SettingsParse {
        /// Path of the settings file.
        path: Utf8PathBuf,
        /// The TOML deserialization error.
        #[source]
        source: toml::de::Error,
    },
}

/// Result type alias using [`MirrorError`].
pub type Result<T> = std::result::Result<T, MirrorError>;
