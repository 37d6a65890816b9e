//! Shared test utilities for the mirror crate.

use crate::transport::{Transport, TransportError};
use camino::Utf8Path;
use std::cell::RefCell;
use std::collections::HashMap;
use url::Url;

/// Builds index YAML listing one version per `(name, version, url)` triple.
///
/// Versions of the same chart must be passed consecutively.
#[must_use]
pub fn index_yaml(charts: &[(&str, &str, &str)]) -> String {
    let mut yaml = String::from("apiVersion: v1\nentries:\n");
    let mut current: Option<&str> = None;
    for (name, version, url) in charts {
        if current != Some(*name) {
            yaml.push_str(&format!("  {name}:\n"));
            current = Some(*name);
        }
        yaml.push_str(&format!(
            "    - name: {name}\n      version: {version}\n      urls:\n        - {url}\n"
        ));
    }
    yaml
}

/// An in-memory [`Transport`] serving one index and a set of archives.
///
/// URLs without a registered response answer with
/// [`TransportError::NotFound`]. Every request is recorded in order.
#[derive(Debug, Default)]
pub struct StubTransport {
    manifest: Option<String>,
    artifacts: HashMap<String, Vec<u8>>,
    requests: RefCell<Vec<String>>,
}

impl StubTransport {
    /// Creates a transport serving `manifest` as the index.
    #[must_use]
    pub fn with_manifest(manifest: impl Into<String>) -> Self {
        Self {
            manifest: Some(manifest.into()),
            ..Self::default()
        }
    }

    /// Registers the archive bytes returned for `url`.
    #[must_use]
    pub fn with_artifact(mut self, url: &str, bytes: &[u8]) -> Self {
        self.artifacts.insert(url.to_owned(), bytes.to_vec());
        self
    }

    /// URLs requested so far.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    fn record(&self, url: &Url) {
        self.requests.borrow_mut().push(url.to_string());
    }
}

impl Transport for StubTransport {
    fn fetch_manifest(&self, url: &Url, dest: &Utf8Path) -> Result<(), TransportError> {
        self.record(url);
        let manifest = self.manifest.as_ref().ok_or_else(|| TransportError::NotFound {
            url: url.to_string(),
        })?;
        std::fs::write(dest, manifest)?;
        Ok(())
    }

    fn fetch_artifact(&self, url: &Url) -> Result<Vec<u8>, TransportError> {
        self.record(url);
        self.artifacts
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| TransportError::NotFound {
                url: url.to_string(),
            })
    }
}
