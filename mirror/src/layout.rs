//! On-disk layout of a mirrored repository.
//!
//! Everything a run writes lives under `<dest_root>/<identifier>/`:
//!
//! - `downloaded-index.yaml` while the run is in progress,
//! - `rewritten-index.yaml` briefly, while the index is being rewritten,
//! - `index.yaml` once the run has published,
//! - each archive at `<derived-subpath>/<name>-<version>.tgz`.
//!
//! The derived sub-path is the directory part of the archive URL, taken
//! relative to the source base path when the archive lives beneath it, with
//! each segment percent-decoded. Any path component coming from remote data
//! is validated after decoding so that nothing can be written outside the
//! mirror root.

use crate::catalog::PackageEntry;
use crate::repository::{INDEX_FILE, RepositoryConfig};
use camino::{Utf8Path, Utf8PathBuf};
use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use url::Url;

/// Name of the index while it is being downloaded and rewritten.
pub const TEMPORARY_INDEX_FILE: &str = "downloaded-index.yaml";

/// Name the rewritten index is staged under before it replaces the
/// temporary index.
pub const REWRITE_STAGING_FILE: &str = "rewritten-index.yaml";

/// Errors arising from archive path derivation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// A remote-supplied component would escape or alias the mirror root.
    #[error("unsafe path component \"{component}\" in {context}")]
    UnsafeComponent {
        /// The rejected component.
        component: String,
        /// Where the component came from.
        context: String,
    },
}

/// Paths of one repository mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorLayout {
    root: Utf8PathBuf,
}

impl MirrorLayout {
    /// Layout rooted at `<dest_root>/<identifier>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use chartmirror::layout::MirrorLayout;
    /// use chartmirror::repository::RepositoryConfig;
    ///
    /// let repo = RepositoryConfig::new("demo", "https://repo.example/charts", None)
    ///     .expect("valid repository");
    /// let layout = MirrorLayout::new(Utf8Path::new("/srv/mirrors"), &repo);
    /// assert_eq!(layout.index_path(), Utf8Path::new("/srv/mirrors/demo/index.yaml"));
    /// ```
    #[must_use]
    pub fn new(dest_root: &Utf8Path, repository: &RepositoryConfig) -> Self {
        Self {
            root: dest_root.join(repository.identifier()),
        }
    }

    /// The mirror root directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Path of the canonical, published index.
    #[must_use]
    pub fn index_path(&self) -> Utf8PathBuf {
        self.root.join(INDEX_FILE)
    }

    /// Path of the in-progress index.
    #[must_use]
    pub fn temporary_index_path(&self) -> Utf8PathBuf {
        self.root.join(TEMPORARY_INDEX_FILE)
    }

    /// Path the rewritten index is written to before it replaces the
    /// temporary index.
    #[must_use]
    pub fn rewrite_staging_path(&self) -> Utf8PathBuf {
        self.root.join(REWRITE_STAGING_FILE)
    }

    /// Local path for an archive of `entry` downloaded from `url`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::UnsafeComponent`] if a URL path segment, the
    /// package name, or the version would let the path escape the root.
    pub fn artifact_path(
        &self,
        source: &Url,
        url: &Url,
        entry: &PackageEntry,
    ) -> Result<Utf8PathBuf, LayoutError> {
        let filename = entry.archive_filename();
        check_component(&filename, "archive file name")?;

        let mut path = self.root.clone();
        for segment in relative_directory(source, url) {
            let decoded = decode_segment(segment, url.as_str())?;
            check_component(&decoded, url.as_str())?;
            path.push(decoded.as_ref());
        }
        path.push(filename);
        Ok(path)
    }
}

/// Directory segments of `url` below the source base path.
///
/// Segments are taken from the URL path minus its final (file) segment. When
/// that directory lies under the source path, the source prefix is removed.
fn relative_directory<'a>(source: &Url, url: &'a Url) -> Vec<&'a str> {
    let mut directory: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();
    if !url.path().ends_with('/') {
        directory.pop();
    }

    let base: Vec<&str> = source
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    let under_source =
        base.len() <= directory.len() && directory.iter().zip(&base).all(|(d, b)| d == b);
    if under_source {
        directory.split_off(base.len())
    } else {
        directory
    }
}

/// Percent-decode one URL path segment; invalid UTF-8 is unsafe.
fn decode_segment<'a>(segment: &'a str, context: &str) -> Result<Cow<'a, str>, LayoutError> {
    percent_decode_str(segment)
        .decode_utf8()
        .map_err(|_| LayoutError::UnsafeComponent {
            component: segment.to_owned(),
            context: context.to_owned(),
        })
}

fn check_component(component: &str, context: &str) -> Result<(), LayoutError> {
    let unsafe_component = component.is_empty()
        || component == "."
        || component == ".."
        || component.contains(['/', '\\', '\0']);
    if unsafe_component {
        return Err(LayoutError::UnsafeComponent {
            component: component.to_owned(),
            context: context.to_owned(),
        });
    }
    Ok(())
}
