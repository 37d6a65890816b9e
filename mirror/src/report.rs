//! Per-archive outcomes of a mirror run.

use crate::catalog::{PackageEntry, PackageName};
use camino::{Utf8Path, Utf8PathBuf};

/// What happened to one archive location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactOutcome {
    /// The archive was written to `path`.
    Written {
        /// Local archive path.
        path: Utf8PathBuf,
    },
    /// The failure was tolerated and the location skipped.
    Skipped {
        /// Rendered error message.
        reason: String,
    },
}

/// Record of one attempted archive location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRecord {
    /// Package name.
    pub name: PackageName,
    /// Package version.
    pub version: String,
    /// Location as listed in the index.
    pub location: String,
    /// Result of the attempt.
    pub outcome: ArtifactOutcome,
}

/// Accumulated results of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorReport {
    selected: usize,
    records: Vec<ArtifactRecord>,
    rewrites: usize,
    index_path: Option<Utf8PathBuf>,
}

impl MirrorReport {
    /// Record how many entries were selected.
    pub const fn set_selected(&mut self, selected: usize) {
        self.selected = selected;
    }

    /// Record a written archive.
    pub fn record_written(&mut self, entry: &PackageEntry, location: &str, path: Utf8PathBuf) {
        self.push(entry, location, ArtifactOutcome::Written { path });
    }

    /// Record a tolerated failure.
    pub fn record_skipped(&mut self, entry: &PackageEntry, location: &str, reason: String) {
        self.push(entry, location, ArtifactOutcome::Skipped { reason });
    }

    /// Record a successful publish.
    pub fn record_published(&mut self, index_path: Utf8PathBuf, rewrites: usize) {
        self.index_path = Some(index_path);
        self.rewrites = rewrites;
    }

    fn push(&mut self, entry: &PackageEntry, location: &str, outcome: ArtifactOutcome) {
        self.records.push(ArtifactRecord {
            name: entry.name.clone(),
            version: entry.version.clone(),
            location: location.to_owned(),
            outcome,
        });
    }

    /// Number of entries selected for download.
    #[must_use]
    pub const fn selected(&self) -> usize {
        self.selected
    }

    /// Every attempted location in download order.
    #[must_use]
    pub fn records(&self) -> &[ArtifactRecord] {
        &self.records
    }

    /// Paths of the archives that were written.
    pub fn written(&self) -> impl Iterator<Item = &Utf8Path> {
        self.records.iter().filter_map(|r| match &r.outcome {
            ArtifactOutcome::Written { path } => Some(path.as_path()),
            ArtifactOutcome::Skipped { .. } => None,
        })
    }

    /// Records of the locations that were skipped.
    pub fn skipped(&self) -> impl Iterator<Item = &ArtifactRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, ArtifactOutcome::Skipped { .. }))
    }

    /// Number of location references rewritten in the published index.
    #[must_use]
    pub const fn rewrites(&self) -> usize {
        self.rewrites
    }

    /// Path of the published index, once the run has published.
    #[must_use]
    pub fn index_path(&self) -> Option<&Utf8Path> {
        self.index_path.as_deref()
    }
}
