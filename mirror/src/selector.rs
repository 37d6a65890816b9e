//! Package selection from a parsed catalog.
//!
//! Selection runs in two passes: a loose name search delegated to a
//! [`Matcher`], then exact name and version refinements applied here.

use crate::catalog::{Catalog, PackageEntry, PackageName};
use crate::matcher::{MatchError, Matcher};

/// What the caller asked to mirror.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionCriteria {
    /// Loose name pattern; empty matches everything.
    pub pattern: String,
    /// When set, only entries with exactly this name are kept.
    pub exact_name: Option<PackageName>,
    /// When set, only entries with exactly this version are kept.
    pub exact_version: Option<String>,
    /// Whether more than one version of a package may be selected.
    pub multiple_versions: bool,
}

impl SelectionCriteria {
    /// Build criteria from the user-facing filters.
    ///
    /// A chart name becomes both the loose pattern and the exact-name
    /// requirement. Pinning a version implies that every version must be
    /// searched, otherwise the pin could only ever match the newest release.
    /// Blank filters are treated as absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use chartmirror::selector::SelectionCriteria;
    ///
    /// let criteria = SelectionCriteria::from_filters(Some("app"), Some("1.0.0"), false);
    /// assert_eq!(criteria.pattern, "app");
    /// assert!(criteria.multiple_versions);
    ///
    /// let everything = SelectionCriteria::from_filters(None, None, false);
    /// assert!(everything.exact_name.is_none());
    /// assert!(!everything.multiple_versions);
    /// ```
    #[must_use]
    pub fn from_filters(
        chart_name: Option<&str>,
        chart_version: Option<&str>,
        all_versions: bool,
    ) -> Self {
        let chart_name = chart_name.map(str::trim).filter(|n| !n.is_empty());
        let chart_version = chart_version.map(str::trim).filter(|v| !v.is_empty());
        Self {
            pattern: chart_name.unwrap_or_default().to_owned(),
            exact_name: chart_name.map(PackageName::from),
            exact_version: chart_version.map(str::to_owned),
            multiple_versions: all_versions || chart_version.is_some(),
        }
    }

    /// Whether `entry` passes the exact name and version refinements.
    #[must_use]
    pub fn accepts(&self, entry: &PackageEntry) -> bool {
        let name_ok = self.exact_name.as_ref().is_none_or(|n| *n == entry.name);
        let version_ok = self
            .exact_version
            .as_deref()
            .is_none_or(|v| v == entry.version);
        name_ok && version_ok
    }
}

/// Filters a catalog down to the entries matching [`SelectionCriteria`].
pub struct PackageSelector<'a> {
    matcher: &'a dyn Matcher,
}

impl<'a> PackageSelector<'a> {
    /// Create a selector backed by `matcher`.
    #[must_use]
    pub fn new(matcher: &'a dyn Matcher) -> Self {
        Self { matcher }
    }

    /// Select the matching entries, preserving catalog order.
    ///
    /// An empty result is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the matcher cannot evaluate the pattern.
    pub fn select(
        &self,
        catalog: &Catalog,
        criteria: &SelectionCriteria,
    ) -> Result<Vec<PackageEntry>, MatchError> {
        let candidates =
            self.matcher
                .find(catalog, &criteria.pattern, criteria.multiple_versions)?;
        let selected: Vec<PackageEntry> = candidates
            .into_iter()
            .filter(|entry| criteria.accepts(entry))
            .collect();
        log::debug!(
            "selected {} of {} catalog entries",
            selected.len(),
            catalog.len()
        );
        Ok(selected)
    }
}
