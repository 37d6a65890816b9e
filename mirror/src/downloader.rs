//! Archive retrieval for selected packages.
//!
//! Every location of every selected entry is fetched in order and written
//! under the mirror root. Failures go through the run's [`ErrorPolicy`]:
//! strict runs stop at the first one, tolerant runs print a warning naming
//! the package and move on.

use crate::catalog::PackageEntry;
use crate::error::{ArtifactCause, FsOperation, MirrorError, Result};
use crate::layout::MirrorLayout;
use crate::output::{skip_warning, write_stderr_line};
use crate::policy::{Attempt, ErrorPolicy};
use crate::report::MirrorReport;
use crate::repository::RepositoryConfig;
use crate::transport::Transport;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io::Write;
use url::Url;

/// Downloads archives for selected entries.
pub struct ArtifactDownloader<'a> {
    transport: &'a dyn Transport,
    repository: &'a RepositoryConfig,
    layout: &'a MirrorLayout,
    policy: ErrorPolicy,
}

impl<'a> ArtifactDownloader<'a> {
    /// Create a downloader writing into `layout`.
    #[must_use]
    pub fn new(
        transport: &'a dyn Transport,
        repository: &'a RepositoryConfig,
        layout: &'a MirrorLayout,
        policy: ErrorPolicy,
    ) -> Self {
        Self {
            transport,
            repository,
            layout,
            policy,
        }
    }

    /// Download every location of every entry, recording outcomes in `report`.
    ///
    /// Archives written before a fatal failure are left on disk.
    ///
    /// # Errors
    ///
    /// Returns the first failure when the policy is strict.
    pub fn download_all(
        &self,
        entries: &[PackageEntry],
        report: &mut MirrorReport,
        stderr: &mut dyn Write,
    ) -> Result<()> {
        for entry in entries {
            if entry.urls.is_empty() {
                log::debug!("{entry} lists no archive locations");
            }
            for location in &entry.urls {
                match self.policy.apply(self.download(entry, location))? {
                    Attempt::Completed(path) => {
                        log::info!("mirrored {entry} to {path}");
                        report.record_written(entry, location, path);
                    }
                    Attempt::Skipped(err) => {
                        log::warn!("skipping {entry}: {err}");
                        write_stderr_line(stderr, skip_warning(entry, &err));
                        report.record_skipped(entry, location, err.to_string());
                    }
                }
            }
        }
        Ok(())
    }

    /// Local path an archive location maps to, without fetching it.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Artifact`] if the location cannot be resolved
    /// or maps outside the mirror root.
    pub fn local_path(&self, entry: &PackageEntry, location: &str) -> Result<Utf8PathBuf> {
        self.resolve(entry, location).map(|(_url, path)| path)
    }

    fn download(&self, entry: &PackageEntry, location: &str) -> Result<Utf8PathBuf> {
        let (url, path) = self.resolve(entry, location)?;
        let bytes = self
            .transport
            .fetch_artifact(&url)
            .map_err(|e| artifact_error(entry, location, e.into()))?;
        write_file(&path, &bytes)?;
        Ok(path)
    }

    fn resolve(&self, entry: &PackageEntry, location: &str) -> Result<(Url, Utf8PathBuf)> {
        let url = self
            .repository
            .resolve_location(location)
            .map_err(|e| artifact_error(entry, location, e.into()))?;
        let path = self
            .layout
            .artifact_path(self.repository.source(), &url, entry)
            .map_err(|e| artifact_error(entry, location, e.into()))?;
        Ok((url, path))
    }
}

fn artifact_error(entry: &PackageEntry, location: &str, cause: ArtifactCause) -> MirrorError {
    MirrorError::Artifact {
        name: entry.name.clone(),
        version: entry.version.clone(),
        location: location.to_owned(),
        cause,
    }
}

/// Write `content` to `path`, creating parent directories first.
///
/// # Errors
///
/// Returns [`MirrorError::Filesystem`] naming the failed operation.
pub fn write_file(path: &Utf8Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| MirrorError::Filesystem {
            operation: FsOperation::CreateDirectory,
            path: parent.to_owned(),
            source,
        })?;
    }
    fs::write(path, content).map_err(|source| MirrorError::Filesystem {
        operation: FsOperation::WriteFile,
        path: path.to_owned(),
        source,
    })
}

#[cfg(test)]
#[path = "downloader_tests.rs"]
mod tests;
