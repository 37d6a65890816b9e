//! Chart repository index parsing.
//!
//! Loads an `index.yaml` file into a [`Catalog`]. The index groups versions
//! under their chart name:
//!
//! ```yaml
//! apiVersion: v1
//! entries:
//!   app:
//!     - name: app
//!       version: 1.0.0
//!       urls:
//!         - https://repo.example/charts/app-1.0.0.tgz
//! generated: "2024-01-01T00:00:00Z"
//! ```
//!
//! Only the fields the mirror needs are read; everything else in the file is
//! ignored here and preserved byte-for-byte on disk.

use crate::catalog::{Catalog, PackageEntry, PackageName};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Trait for turning a downloaded index file into a [`Catalog`].
pub trait ManifestParser {
    /// Load and parse the index at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid index.
    fn parse(&self, path: &Utf8Path) -> Result<Catalog, ManifestParseError>;
}

/// Errors arising from index parsing.
#[derive(Debug, thiserror::Error)]
pub enum ManifestParseError {
    /// The index file could not be read.
    #[error("cannot read index {path}: {source}")]
    Read {
        /// Path of the index file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// YAML deserialization failed.
    #[error("index parse error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// The document has no `apiVersion`, so it is not a repository index.
    #[error("index {path} does not declare an apiVersion")]
    MissingApiVersion {
        /// Path of the index file.
        path: Utf8PathBuf,
    },
}

/// Parser for chart repository `index.yaml` documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlManifestParser;

impl ManifestParser for YamlManifestParser {
    fn parse(&self, path: &Utf8Path) -> Result<Catalog, ManifestParseError> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| ManifestParseError::Read {
                path: path.to_owned(),
                source,
            })?;
        let catalog = parse_index(&contents).map_err(|err| match err {
            ManifestParseError::MissingApiVersion { .. } => ManifestParseError::MissingApiVersion {
                path: path.to_owned(),
            },
            other => other,
        })?;
        log::debug!("parsed {} index entries from {path}", catalog.len());
        Ok(catalog)
    }
}

#[derive(Debug, Deserialize)]
struct IndexDocument {
    #[serde(rename = "apiVersion", default)]
    api_version: Option<String>,
    #[serde(default)]
    entries: Option<BTreeMap<String, Vec<IndexVersion>>>,
}

#[derive(Debug, Deserialize)]
struct IndexVersion {
    #[serde(default)]
    name: Option<String>,
    version: String,
    #[serde(default)]
    urls: Vec<String>,
}

/// Parse index YAML text into a [`Catalog`].
///
/// Charts are ordered by name; each chart's versions are ordered newest first
/// by semantic version, with versions that are not valid semver kept in their
/// published order after the valid ones. A version record without a `name`
/// takes the name of the chart it is listed under.
///
/// # Errors
///
/// Returns an error if the YAML is malformed or has no `apiVersion`.
///
/// # Examples
///
/// ```
/// use chartmirror::manifest::parse_index;
///
/// let yaml = concat!(
///     "apiVersion: v1\n",
///     "entries:\n",
///     "  app:\n",
///     "    - version: 1.0.0\n",
///     "      urls: [https://repo.example/app-1.0.0.tgz]\n",
///     "    - version: 1.2.0\n",
///     "      urls: [https://repo.example/app-1.2.0.tgz]\n",
/// );
/// let catalog = parse_index(yaml).expect("valid index");
/// assert_eq!(catalog.entries()[0].version, "1.2.0");
/// assert_eq!(catalog.entries()[0].name.as_str(), "app");
/// ```
pub fn parse_index(contents: &str) -> Result<Catalog, ManifestParseError> {
    let document: IndexDocument = serde_yaml_ng::from_str(contents)?;
    if document
        .api_version
        .as_deref()
        .is_none_or(|v| v.trim().is_empty())
    {
        return Err(ManifestParseError::MissingApiVersion {
            path: Utf8PathBuf::new(),
        });
    }

    let mut entries = Vec::new();
    for (chart, mut versions) in document.entries.unwrap_or_default() {
        versions.sort_by(|a, b| newest_first(&a.version, &b.version));
        entries.extend(versions.into_iter().map(|record| PackageEntry {
            name: PackageName::new(record.name.unwrap_or_else(|| chart.clone())),
            version: record.version,
            urls: record.urls,
        }));
    }
    Ok(Catalog::new(entries))
}

/// Ordering that places higher semantic versions first.
fn newest_first(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn parse_version(raw: &str) -> Option<semver::Version> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    semver::Version::parse(trimmed).ok()
}
