//! In-memory view of a chart repository index.
//!
//! A [`Catalog`] is the flattened, ordered list of [`PackageEntry`] records
//! produced by a [`crate::manifest::ManifestParser`]. It lives for a single
//! mirror run; only the on-disk index outlives it.

use std::fmt;

/// A semantic package name.
///
/// This newtype keeps chart names distinct from versions and URLs when they
/// travel together through the pipeline. It performs no validation; names
/// that are unsafe as file names are rejected by [`crate::layout`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageName(String);

impl PackageName {
    /// Create a new package name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the package name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PackageName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for PackageName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One named, versioned package with the locations its archive is served from.
///
/// An entry with no locations is valid; the downloader simply has nothing to
/// fetch for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    /// Package name.
    pub name: PackageName,
    /// Version string exactly as published in the index.
    pub version: String,
    /// Archive locations in index order. May be relative to the repository.
    pub urls: Vec<String>,
}

impl PackageEntry {
    /// Create an entry from its parts.
    ///
    /// # Examples
    ///
    /// ```
    /// use chartmirror::catalog::PackageEntry;
    ///
    /// let entry = PackageEntry::new("app", "1.0.0", ["https://repo.example/charts/app-1.0.0.tgz"]);
    /// assert_eq!(entry.name.as_str(), "app");
    /// assert_eq!(entry.urls.len(), 1);
    /// ```
    #[must_use]
    pub fn new<I, S>(name: impl Into<PackageName>, version: impl Into<String>, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            version: version.into(),
            urls: urls.into_iter().map(Into::into).collect(),
        }
    }

    /// The archive file name every location of this entry is stored under.
    #[must_use]
    pub fn archive_filename(&self) -> String {
        format!("{}-{}.tgz", self.name, self.version)
    }
}

impl fmt::Display for PackageEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.version)
    }
}

/// Ordered collection of package entries parsed from one index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<PackageEntry>,
}

impl Catalog {
    /// Create a catalog that preserves the given entry order.
    #[must_use]
    pub const fn new(entries: Vec<PackageEntry>) -> Self {
        Self { entries }
    }

    /// All entries in catalog order.
    #[must_use]
    pub fn entries(&self) -> &[PackageEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in catalog order.
    pub fn iter(&self) -> std::slice::Iter<'_, PackageEntry> {
        self.entries.iter()
    }
}

impl From<Vec<PackageEntry>> for Catalog {
    fn from(entries: Vec<PackageEntry>) -> Self {
        Self::new(entries)
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a PackageEntry;
    type IntoIter = std::slice::Iter<'a, PackageEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
