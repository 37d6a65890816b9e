//! HTTP retrieval of repository indexes and chart archives.
//!
//! Provides a trait-based abstraction over the network so the mirror
//! pipeline can be exercised without network access, plus the production
//! implementation backed by `ureq`.

use camino::Utf8Path;
use std::io::Read;
use std::time::Duration;
use url::Url;

/// Default network timeout applied to every request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for retrieving remote repository content.
///
/// # Examples
///
/// ```
/// use chartmirror::transport::{DEFAULT_TIMEOUT, HttpTransport};
///
/// let transport = HttpTransport::new(DEFAULT_TIMEOUT);
/// // Use transport.fetch_manifest(&index_url, &dest) in production
/// # let _ = transport;
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    /// Download the index at `url` and write it to `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the file cannot be written.
    fn fetch_manifest(&self, url: &Url, dest: &Utf8Path) -> Result<(), TransportError>;

    /// Download the archive at `url` and return its bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be read.
    fn fetch_artifact(&self, url: &Url) -> Result<Vec<u8>, TransportError>;
}

/// Errors arising from transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// HTTP request failed.
    #[error("request failed for {url}: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested resource does not exist (HTTP 404).
    #[error("not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// I/O error writing or reading the downloaded body.
    #[error("I/O error during download: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP transport using a `ureq` agent with a global request timeout.
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    /// Build a transport whose requests give up after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }

    fn get(&self, url: &Url) -> Result<ureq::http::Response<ureq::Body>, TransportError> {
        log::debug!("GET {url}");
        self.agent
            .get(url.as_str())
            .call()
            .map_err(|e| map_ureq_error(url.as_str(), &e))
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Transport for HttpTransport {
    fn fetch_manifest(&self, url: &Url, dest: &Utf8Path) -> Result<(), TransportError> {
        let response = self.get(url)?;
        let mut file = std::fs::File::create(dest)?;
        std::io::copy(&mut response.into_body().into_reader(), &mut file)?;
        Ok(())
    }

    fn fetch_artifact(&self, url: &Url) -> Result<Vec<u8>, TransportError> {
        let mut response = self.get(url)?;
        let mut bytes = Vec::new();
        response
            .body_mut()
            .as_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| TransportError::Http {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(bytes)
    }
}

/// Map a ureq error to a [`TransportError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> TransportError {
    match err {
        ureq::Error::StatusCode(404) => TransportError::NotFound {
            url: url.to_owned(),
        },
        other => TransportError::Http {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
