//! Repository identity and source locations.
//!
//! A [`RepositoryConfig`] names the local mirror directory and records the
//! upstream base URL exactly as the user supplied it. The raw string is kept
//! alongside the parsed URL because the publish rewrite substitutes the
//! literal text, not a normalised form.

use crate::error::ConfigError;
use camino::Utf8Path;
use url::Url;

/// File name appended to the source base URL to reach the index.
pub const INDEX_FILE: &str = "index.yaml";

/// Immutable description of the repository being mirrored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    identifier: String,
    source_url: String,
    source: Url,
    new_root_url: Option<String>,
}

impl RepositoryConfig {
    /// Validate and build a repository configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `identifier` is not a single plain directory
    /// name, if `source_url` is not an absolute URL, or if `new_root_url` is
    /// present but blank.
    ///
    /// # Examples
    ///
    /// ```
    /// use chartmirror::repository::RepositoryConfig;
    ///
    /// let repo = RepositoryConfig::new("demo", "https://repo.example/charts", None)
    ///     .expect("valid repository");
    /// assert_eq!(repo.identifier(), "demo");
    /// assert_eq!(repo.index_url().as_str(), "https://repo.example/charts/index.yaml");
    ///
    /// assert!(RepositoryConfig::new("../escape", "https://repo.example", None).is_err());
    /// ```
    pub fn new(
        identifier: impl Into<String>,
        source_url: impl Into<String>,
        new_root_url: Option<String>,
    ) -> Result<Self, ConfigError> {
        let identifier = identifier.into();
        validate_identifier(&identifier)?;

        let source_url = source_url.into().trim().to_owned();
        let source = Url::parse(&source_url).map_err(|e| ConfigError::InvalidSourceUrl {
            url: source_url.clone(),
            reason: e.to_string(),
        })?;
        if source.cannot_be_a_base() {
            return Err(ConfigError::InvalidSourceUrl {
                url: source_url,
                reason: "URL cannot be used as a base".to_owned(),
            });
        }

        if new_root_url.as_deref().is_some_and(|u| u.trim().is_empty()) {
            return Err(ConfigError::BlankNewRootUrl);
        }

        Ok(Self {
            identifier,
            source_url,
            source,
            new_root_url,
        })
    }

    /// The local mirror directory name.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The source base URL exactly as supplied.
    #[must_use]
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// The parsed source base URL.
    #[must_use]
    pub const fn source(&self) -> &Url {
        &self.source
    }

    /// The base URL the published index should point at, if rewriting.
    #[must_use]
    pub fn new_root_url(&self) -> Option<&str> {
        self.new_root_url.as_deref()
    }

    /// The source base URL with a trailing slash, suitable for joining.
    #[must_use]
    pub fn base_directory(&self) -> Url {
        let mut base = self.source.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base
    }

    /// Location of the remote index.
    #[must_use]
    pub fn index_url(&self) -> Url {
        let mut url = self.base_directory();
        let path = format!("{}{INDEX_FILE}", url.path());
        url.set_path(&path);
        url
    }

    /// Resolve an archive location from the index against the source base.
    ///
    /// Absolute locations are returned unchanged; relative ones are joined
    /// onto the base directory.
    ///
    /// # Errors
    ///
    /// Returns the URL parse error if the location cannot be resolved.
    pub fn resolve_location(&self, location: &str) -> Result<Url, url::ParseError> {
        match Url::parse(location) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => self.base_directory().join(location),
            Err(other) => Err(other),
        }
    }
}

fn validate_identifier(identifier: &str) -> Result<(), ConfigError> {
    let mut components = Utf8Path::new(identifier).components();
    let is_single_normal = matches!(
        (components.next(), components.next()),
        (Some(camino::Utf8Component::Normal(_)), None)
    );
    if identifier.trim().is_empty() || !is_single_normal || identifier.contains(['/', '\\']) {
        return Err(ConfigError::InvalidIdentifier {
            identifier: identifier.to_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn repo(source: &str) -> RepositoryConfig {
        RepositoryConfig::new("demo", source, None).expect("valid repository")
    }

    #[rstest]
    #[case::no_trailing_slash("https://repo.example/charts", "https://repo.example/charts/index.yaml")]
    #[case::trailing_slash("https://repo.example/charts/", "https://repo.example/charts/index.yaml")]
    #[case::host_only("https://repo.example", "https://repo.example/index.yaml")]
    fn index_url_appends_index_file(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(repo(source).index_url().as_str(), expected);
    }

    #[rstest]
    #[case::absolute("https://cdn.example/app-1.0.0.tgz", "https://cdn.example/app-1.0.0.tgz")]
    #[case::relative("app-1.0.0.tgz", "https://repo.example/charts/app-1.0.0.tgz")]
    #[case::relative_nested("sub/app-1.0.0.tgz", "https://repo.example/charts/sub/app-1.0.0.tgz")]
    fn resolve_location_handles_relative_urls(#[case] location: &str, #[case] expected: &str) {
        let resolved = repo("https://repo.example/charts")
            .resolve_location(location)
            .expect("resolvable");
        assert_eq!(resolved.as_str(), expected);
    }

    #[test]
    fn source_url_is_kept_verbatim() {
        let repo = repo("https://repo.example");
        assert_eq!(repo.source_url(), "https://repo.example");
        assert_eq!(repo.source().as_str(), "https://repo.example/");
    }

    #[rstest]
    #[case::empty("")]
    #[case::parent("..")]
    #[case::current(".")]
    #[case::nested("a/b")]
    #[case::absolute("/srv/mirror")]
    #[case::backslash("a\\b")]
    fn rejects_unsafe_identifiers(#[case] identifier: &str) {
        let err = RepositoryConfig::new(identifier, "https://repo.example", None)
            .expect_err("expected identifier rejection");
        assert!(matches!(err, ConfigError::InvalidIdentifier { .. }));
    }

    #[rstest]
    #[case::not_a_url("repo.example/charts")]
    #[case::mailto("mailto:charts@repo.example")]
    fn rejects_non_base_source_urls(#[case] source: &str) {
        let err = RepositoryConfig::new("demo", source, None).expect_err("expected URL rejection");
        assert!(matches!(err, ConfigError::InvalidSourceUrl { .. }));
    }

    #[test]
    fn rejects_blank_new_root_url() {
        let err = RepositoryConfig::new("demo", "https://repo.example", Some(" ".to_owned()))
            .expect_err("expected blank rejection");
        assert!(matches!(err, ConfigError::BlankNewRootUrl));
    }
}
