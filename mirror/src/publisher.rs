//! Index rewrite and promotion.
//!
//! Publishing happens in two steps. [`ManifestPublisher::rewrite`] replaces
//! the source base URL inside the temporary index with the configured new
//! root, and [`ManifestPublisher::promote`] renames the temporary file over
//! the canonical `index.yaml`. The rename is a single directory-entry
//! replacement, so readers only ever see the previous index or the new one.
//! The rewrite itself is staged in a separate file, so a failed write leaves
//! the temporary index as it was acquired.
//!
//! The rewrite is a literal byte substitution. Any occurrence of the source
//! URL is replaced, including ones that are not archive locations.

use crate::error::{MirrorError, PublishStage, Result};
use crate::layout::MirrorLayout;
use crate::output::write_stderr_line;
use crate::policy::{Attempt, ErrorPolicy};
use crate::repository::RepositoryConfig;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io::{self, Write};

/// What publishing did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    /// Canonical index path.
    pub index_path: Utf8PathBuf,
    /// Number of source URL occurrences rewritten.
    pub rewrites: usize,
}

/// Rewrites and promotes the temporary index of one mirror.
pub struct ManifestPublisher<'a> {
    repository: &'a RepositoryConfig,
    layout: &'a MirrorLayout,
    policy: ErrorPolicy,
}

impl<'a> ManifestPublisher<'a> {
    /// Create a publisher for `layout`.
    #[must_use]
    pub const fn new(
        repository: &'a RepositoryConfig,
        layout: &'a MirrorLayout,
        policy: ErrorPolicy,
    ) -> Self {
        Self {
            repository,
            layout,
            policy,
        }
    }

    /// Rewrite when a new root is configured, then promote.
    ///
    /// A tolerated rewrite failure is reported on `stderr` and the index is
    /// published unrewritten.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Publish`] if the temporary index cannot be read,
    /// if writing the rewrite fails in strict mode, or if the rename fails.
    pub fn publish(&self, stderr: &mut dyn Write) -> Result<Published> {
        let rewrites = match self.policy.apply(self.rewrite())? {
            Attempt::Completed(count) => count,
            Attempt::Skipped(err) => {
                log::warn!("publishing index without rewrite: {err}");
                write_stderr_line(stderr, format!("WARNING: {err}"));
                0
            }
        };
        let index_path = self.promote()?;
        Ok(Published {
            index_path,
            rewrites,
        })
    }

    /// Replace the source URL in the temporary index with the new root.
    ///
    /// Does nothing and returns zero when no new root is configured.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Publish`] tagged with the failing stage.
    pub fn rewrite(&self) -> Result<usize> {
        let Some(new_root) = self.repository.new_root_url() else {
            return Ok(0);
        };
        let path = self.layout.temporary_index_path();
        let content = fs::read(&path).map_err(|source| MirrorError::Publish {
            stage: PublishStage::ReadForRewrite,
            path: path.clone(),
            source,
        })?;

        let (rewritten, count) =
            rewrite_locations(&content, self.repository.source_url(), new_root);
        log::debug!(
            "replacing {count} occurrence(s) of {} with {new_root} in {path}",
            self.repository.source_url()
        );
        self.replace_temporary(&path, &rewritten)?;
        Ok(count)
    }

    /// Stage `content` beside the temporary index, then rename it over it.
    ///
    /// The temporary index keeps its acquired bytes unless the staged copy
    /// was written in full.
    fn replace_temporary(&self, path: &Utf8Path, content: &[u8]) -> Result<()> {
        let staging = self.layout.rewrite_staging_path();
        let staged = fs::write(&staging, content).and_then(|()| fs::rename(&staging, path));
        if let Err(source) = staged {
            match fs::remove_file(&staging) {
                Ok(()) => log::debug!("removed {staging}"),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => log::warn!("could not remove {staging}: {err}"),
            }
            return Err(MirrorError::Publish {
                stage: PublishStage::WriteRewrite,
                path: staging,
                source,
            });
        }
        Ok(())
    }

    /// Rename the temporary index over the canonical one.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Publish`] at the rename stage; the canonical
    /// index is left as it was.
    pub fn promote(&self) -> Result<Utf8PathBuf> {
        let from = self.layout.temporary_index_path();
        let to = self.layout.index_path();
        fs::rename(&from, &to).map_err(|source| MirrorError::Publish {
            stage: PublishStage::Rename,
            path: to.clone(),
            source,
        })?;
        log::debug!("published {to}");
        Ok(to)
    }
}

/// Replace every occurrence of `from` in `content` with `to`.
///
/// Returns the new bytes and the number of replacements.
///
/// # Examples
///
/// ```
/// use chartmirror::publisher::rewrite_locations;
///
/// let (out, count) = rewrite_locations(b"a=http://x b=http://x", "http://x", "http://y");
/// assert_eq!(out, b"a=http://y b=http://y");
/// assert_eq!(count, 2);
/// ```
#[must_use]
pub fn rewrite_locations(content: &[u8], from: &str, to: &str) -> (Vec<u8>, usize) {
    let needle = from.as_bytes();
    if needle.is_empty() {
        return (content.to_vec(), 0);
    }

    let mut output = Vec::with_capacity(content.len());
    let mut count = 0;
    let mut rest = content;
    while let Some(offset) = rest.windows(needle.len()).position(|w| w == needle) {
        let (head, tail) = rest.split_at(offset);
        output.extend_from_slice(head);
        output.extend_from_slice(to.as_bytes());
        rest = tail.get(needle.len()..).unwrap_or_default();
        count += 1;
    }
    output.extend_from_slice(rest);
    (output, count)
}
