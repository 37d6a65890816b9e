//! Loose name matching over a [`Catalog`].
//!
//! The matcher is deliberately permissive: it finds every entry whose name
//! contains the requested pattern. Exact name and version checks are layered
//! on top by [`crate::selector::PackageSelector`].

use crate::catalog::{Catalog, PackageEntry};
use regex::Regex;
use std::collections::HashSet;

/// Trait for finding candidate entries by name pattern.
pub trait Matcher {
    /// Return entries whose name matches `pattern`, in catalog order.
    ///
    /// When `all_versions` is false only the first entry seen for each
    /// package name is returned, which is the newest version for catalogs
    /// produced by [`crate::manifest::YamlManifestParser`].
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern cannot be evaluated.
    fn find(
        &self,
        catalog: &Catalog,
        pattern: &str,
        all_versions: bool,
    ) -> Result<Vec<PackageEntry>, MatchError>;
}

/// Errors arising from pattern evaluation.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// The pattern is not a valid regular expression.
    #[error("invalid name pattern \"{pattern}\": {source}")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// The regex compilation error.
        #[source]
        source: regex::Error,
    },
}

/// Matcher evaluating `^.*<pattern>.*$` against entry names.
///
/// The pattern is interpreted as a regular expression fragment, so an empty
/// pattern matches every entry.
///
/// # Examples
///
/// ```
/// use chartmirror::catalog::{Catalog, PackageEntry};
/// use chartmirror::matcher::{Matcher, RegexMatcher};
///
/// let catalog = Catalog::from(vec![
///     PackageEntry::new("nginx", "1.0.0", Vec::<String>::new()),
///     PackageEntry::new("redis", "7.0.0", Vec::<String>::new()),
/// ]);
/// let found = RegexMatcher.find(&catalog, "gin", true).expect("valid pattern");
/// assert_eq!(found.len(), 1);
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexMatcher;

impl Matcher for RegexMatcher {
    fn find(
        &self,
        catalog: &Catalog,
        pattern: &str,
        all_versions: bool,
    ) -> Result<Vec<PackageEntry>, MatchError> {
        let expression =
            Regex::new(&format!("^.*{pattern}.*$")).map_err(|source| MatchError::InvalidPattern {
                pattern: pattern.to_owned(),
                source,
            })?;

        let mut seen = HashSet::new();
        let found = catalog
            .iter()
            .filter(|entry| expression.is_match(entry.name.as_str()))
            .filter(|entry| all_versions || seen.insert(entry.name.clone()))
            .cloned()
            .collect();
        Ok(found)
    }
}
