//! Mirror run orchestration.
//!
//! A [`MirrorJob`] owns the settings of one run and drives the pipeline in a
//! fixed order: acquire the index, select packages, download archives, then
//! publish the index. Every archive is written (or skipped) before the index
//! is published, so a published index never names an archive the run is
//! still fetching.

use crate::acquisition::ManifestAcquisition;
use crate::catalog::PackageEntry;
use crate::downloader::ArtifactDownloader;
use crate::error::Result;
use crate::layout::MirrorLayout;
use crate::manifest::{ManifestParser, YamlManifestParser};
use crate::matcher::{Matcher, RegexMatcher};
use crate::output::{skip_warning, write_stderr_line};
use crate::policy::Attempt;
use crate::publisher::ManifestPublisher;
use crate::report::MirrorReport;
use crate::selector::PackageSelector;
use crate::settings::MirrorSettings;
use crate::transport::{HttpTransport, Transport};
use camino::Utf8PathBuf;
use std::fmt;
use std::io::Write;

/// Where a job is in its pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    /// Not yet run.
    #[default]
    Start,
    /// The index has been downloaded and parsed.
    Acquired,
    /// Packages have been selected.
    Selected,
    /// Every selected archive has been written or skipped.
    Downloaded,
    /// The index has been promoted to its canonical name.
    Published,
    /// The run finished successfully.
    Done,
    /// The run stopped with an error.
    Failed,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Acquired => "acquired",
            Self::Selected => "selected",
            Self::Downloaded => "downloaded",
            Self::Published => "published",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// The external services a job relies on.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    /// Retrieves the index and archives.
    pub transport: &'a dyn Transport,
    /// Turns the downloaded index into a catalog.
    pub parser: &'a dyn ManifestParser,
    /// Performs the loose name search.
    pub matcher: &'a dyn Matcher,
}

/// An archive a dry run would download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedArtifact {
    /// Package being mirrored.
    pub entry: PackageEntry,
    /// Location as listed in the index.
    pub location: String,
    /// Where the archive would be written.
    pub path: Utf8PathBuf,
}

/// One mirror run.
pub struct MirrorJob<'a> {
    settings: MirrorSettings,
    layout: MirrorLayout,
    collaborators: Collaborators<'a>,
    state: JobState,
}

impl<'a> MirrorJob<'a> {
    /// Create a job from validated settings and its collaborators.
    #[must_use]
    pub fn new(settings: MirrorSettings, collaborators: Collaborators<'a>) -> Self {
        let layout = MirrorLayout::new(&settings.dest_root, &settings.repository);
        Self {
            settings,
            layout,
            collaborators,
            state: JobState::Start,
        }
    }

    /// Current pipeline state.
    #[must_use]
    pub const fn state(&self) -> JobState {
        self.state
    }

    /// Paths this job writes to.
    #[must_use]
    pub const fn layout(&self) -> &MirrorLayout {
        &self.layout
    }

    /// Run the whole pipeline.
    ///
    /// Progress lines go to `stderr` unless the settings ask for quiet
    /// output; tolerated failures are always reported there.
    ///
    /// # Errors
    ///
    /// Returns the first fatal failure. The job is then in
    /// [`JobState::Failed`]; archives already written stay on disk, the
    /// canonical index is left as it was, and the temporary index is removed.
    pub fn run(&mut self, stderr: &mut dyn Write) -> Result<MirrorReport> {
        let result = self.run_pipeline(stderr);
        if result.is_err() {
            self.discard_temporary_index();
        }
        self.finish(result)
    }

    /// Acquire and select, then list where each archive would be written.
    ///
    /// Nothing is downloaded or published, and the temporary index is
    /// removed afterwards.
    ///
    /// # Errors
    ///
    /// Returns acquisition and selection failures, and path derivation
    /// failures in strict mode.
    pub fn plan(&mut self, stderr: &mut dyn Write) -> Result<Vec<PlannedArtifact>> {
        let result = self.plan_pipeline(stderr);
        self.discard_temporary_index();
        self.finish(result)
    }

    fn finish<T>(&mut self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.state = JobState::Done,
            Err(err) => {
                log::debug!("mirror job failed after state {}: {err}", self.state);
                self.state = JobState::Failed;
            }
        }
        result
    }

    fn select(&mut self, stderr: &mut dyn Write) -> Result<Vec<PackageEntry>> {
        let repository = &self.settings.repository;
        self.progress(stderr, format!("Fetching index from {}...", repository.index_url()));
        let acquired =
            ManifestAcquisition::new(self.collaborators.transport, self.collaborators.parser)
                .acquire(repository, &self.layout)?;
        self.state = JobState::Acquired;

        let selected = PackageSelector::new(self.collaborators.matcher)
            .select(&acquired.catalog, &self.settings.criteria)?;
        self.state = JobState::Selected;
        self.progress(
            stderr,
            format!(
                "Selected {} of {} chart version(s)",
                selected.len(),
                acquired.catalog.len()
            ),
        );
        Ok(selected)
    }

    fn run_pipeline(&mut self, stderr: &mut dyn Write) -> Result<MirrorReport> {
        let selected = self.select(stderr)?;
        let mut report = MirrorReport::default();
        report.set_selected(selected.len());

        self.downloader()
            .download_all(&selected, &mut report, stderr)?;
        self.state = JobState::Downloaded;

        self.progress(stderr, "Publishing index...");
        let published = ManifestPublisher::new(
            &self.settings.repository,
            &self.layout,
            self.settings.policy,
        )
        .publish(stderr)?;
        self.state = JobState::Published;
        report.record_published(published.index_path, published.rewrites);
        Ok(report)
    }

    fn plan_pipeline(&mut self, stderr: &mut dyn Write) -> Result<Vec<PlannedArtifact>> {
        let selected = self.select(stderr)?;
        let downloader = self.downloader();
        let mut planned = Vec::new();
        for entry in &selected {
            for location in &entry.urls {
                match self
                    .settings
                    .policy
                    .apply(downloader.local_path(entry, location))?
                {
                    Attempt::Completed(path) => planned.push(PlannedArtifact {
                        entry: entry.clone(),
                        location: location.clone(),
                        path,
                    }),
                    Attempt::Skipped(err) => write_stderr_line(stderr, skip_warning(entry, &err)),
                }
            }
        }
        Ok(planned)
    }

    fn downloader(&self) -> ArtifactDownloader<'_> {
        ArtifactDownloader::new(
            self.collaborators.transport,
            &self.settings.repository,
            &self.layout,
            self.settings.policy,
        )
    }

    fn discard_temporary_index(&self) {
        let path = self.layout.temporary_index_path();
        match std::fs::remove_file(&path) {
            Ok(()) => log::debug!("removed {path}"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => log::warn!("could not remove {path}: {err}"),
        }
    }

    fn progress(&self, stderr: &mut dyn Write, message: impl fmt::Display) {
        if !self.settings.quiet {
            write_stderr_line(stderr, message);
        }
    }
}

/// Mirror a repository with the default HTTP, YAML, and regex collaborators.
///
/// # Errors
///
/// Returns the first fatal failure of the run.
pub fn mirror(settings: MirrorSettings, stderr: &mut dyn Write) -> Result<MirrorReport> {
    let transport = HttpTransport::new(settings.timeout);
    let collaborators = Collaborators {
        transport: &transport,
        parser: &YamlManifestParser,
        matcher: &RegexMatcher,
    };
    MirrorJob::new(settings, collaborators).run(stderr)
}

/// Dry-run counterpart of [`mirror`].
///
/// # Errors
///
/// Returns acquisition, selection, and strict-mode path failures.
pub fn plan(settings: MirrorSettings, stderr: &mut dyn Write) -> Result<Vec<PlannedArtifact>> {
    let transport = HttpTransport::new(settings.timeout);
    let collaborators = Collaborators {
        transport: &transport,
        parser: &YamlManifestParser,
        matcher: &RegexMatcher,
    };
    MirrorJob::new(settings, collaborators).plan(stderr)
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
