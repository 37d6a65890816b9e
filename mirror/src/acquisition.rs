//! Repository index acquisition.
//!
//! Downloads the remote index into the temporary index file of the mirror
//! root and parses it. The canonical `index.yaml` is never touched here; it
//! only changes when [`crate::publisher::ManifestPublisher`] promotes the
//! temporary file.

use crate::catalog::Catalog;
use crate::error::{AcquisitionCause, MirrorError, Result};
use crate::layout::MirrorLayout;
use crate::manifest::ManifestParser;
use crate::repository::RepositoryConfig;
use crate::transport::Transport;
use camino::Utf8PathBuf;

/// A parsed catalog plus the temporary index file it was read from.
#[derive(Debug)]
pub struct AcquiredManifest {
    /// Parsed index entries.
    pub catalog: Catalog,
    /// Path of the downloaded index awaiting publication.
    pub temporary_index: Utf8PathBuf,
}

/// Fetches and parses the remote index.
pub struct ManifestAcquisition<'a> {
    transport: &'a dyn Transport,
    parser: &'a dyn ManifestParser,
}

impl<'a> ManifestAcquisition<'a> {
    /// Create an acquisition step from its collaborators.
    #[must_use]
    pub fn new(transport: &'a dyn Transport, parser: &'a dyn ManifestParser) -> Self {
        Self { transport, parser }
    }

    /// Download the index of `repository` into `layout` and parse it.
    ///
    /// Creates the mirror root if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Acquisition`] if the mirror root cannot be
    /// created, the download fails, or the index cannot be parsed.
    pub fn acquire(
        &self,
        repository: &RepositoryConfig,
        layout: &MirrorLayout,
    ) -> Result<AcquiredManifest> {
        let index_url = repository.index_url();
        let fail = |cause: AcquisitionCause| MirrorError::Acquisition {
            url: index_url.to_string(),
            cause,
        };

        std::fs::create_dir_all(layout.root()).map_err(|source| {
            fail(AcquisitionCause::Destination {
                path: layout.root().to_owned(),
                source,
            })
        })?;

        let temporary_index = layout.temporary_index_path();
        log::debug!("downloading {index_url} to {temporary_index}");
        self.transport
            .fetch_manifest(&index_url, &temporary_index)
            .map_err(|e| fail(e.into()))?;

        let catalog = self
            .parser
            .parse(&temporary_index)
            .map_err(|e| fail(e.into()))?;

        Ok(AcquiredManifest {
            catalog,
            temporary_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::YamlManifestParser;
    use crate::transport::{MockTransport, TransportError};
    use camino::Utf8Path;

    const INDEX: &str = concat!(
        "apiVersion: v1\n",
        "entries:\n",
        "  app:\n",
        "    - version: 1.0.0\n",
        "      urls: [https://repo.example/charts/app-1.0.0.tgz]\n",
    );

    fn setup() -> (tempfile::TempDir, RepositoryConfig, MirrorLayout) {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
        let repo = RepositoryConfig::new("demo", "https://repo.example/charts", None)
            .expect("valid repository");
        let layout = MirrorLayout::new(&root, &repo);
        (temp, repo, layout)
    }

    #[test]
    fn acquire_writes_temporary_index_and_parses_it() {
        let (_temp, repo, layout) = setup();
        let mut transport = MockTransport::new();
        transport
            .expect_fetch_manifest()
            .withf(|url, _dest| url.as_str() == "https://repo.example/charts/index.yaml")
            .times(1)
            .returning(|_url, dest: &Utf8Path| {
                std::fs::write(dest, INDEX).map_err(TransportError::Io)
            });

        let acquired = ManifestAcquisition::new(&transport, &YamlManifestParser)
            .acquire(&repo, &layout)
            .expect("acquisition succeeds");

        assert_eq!(acquired.catalog.len(), 1);
        assert_eq!(acquired.temporary_index, layout.temporary_index_path());
        assert!(acquired.temporary_index.exists());
        assert!(!layout.index_path().exists());
    }

    #[test]
    fn fetch_failure_is_an_acquisition_error() {
        let (_temp, repo, layout) = setup();
        let mut transport = MockTransport::new();
        transport.expect_fetch_manifest().returning(|url, _dest| {
            Err(TransportError::NotFound {
                url: url.to_string(),
            })
        });

        let err = ManifestAcquisition::new(&transport, &YamlManifestParser)
            .acquire(&repo, &layout)
            .expect_err("expected failure");

        assert!(matches!(
            err,
            MirrorError::Acquisition {
                cause: AcquisitionCause::Fetch(TransportError::NotFound { .. }),
                ..
            }
        ));
    }

    #[test]
    fn unparsable_index_is_an_acquisition_error() {
        let (_temp, repo, layout) = setup();
        let mut transport = MockTransport::new();
        transport.expect_fetch_manifest().returning(|_url, dest| {
            std::fs::write(dest, "entries: [not, an, index").map_err(TransportError::Io)
        });

        let err = ManifestAcquisition::new(&transport, &YamlManifestParser)
            .acquire(&repo, &layout)
            .expect_err("expected failure");

        assert!(matches!(
            err,
            MirrorError::Acquisition {
                cause: AcquisitionCause::Parse(_),
                ..
            }
        ));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn unusable_destination_is_an_acquisition_error() {
        let (temp, repo, _layout) = setup();
        let occupied = Utf8PathBuf::try_from(temp.path().join("occupied")).expect("UTF-8 path");
        std::fs::write(&occupied, b"not a directory").expect("write occupied file");
        let layout = MirrorLayout::new(&occupied, &repo);
        let transport = MockTransport::new();

        let err = ManifestAcquisition::new(&transport, &YamlManifestParser)
            .acquire(&repo, &layout)
            .expect_err("expected failure");

        assert!(matches!(
            err,
            MirrorError::Acquisition {
                cause: AcquisitionCause::Destination { .. },
                ..
            }
        ));
    }
}
