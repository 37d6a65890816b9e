//! Chart repository mirroring library.
//!
//! This crate downloads a remote chart repository index, selects the charts a
//! caller asked for, fetches their archives into a local directory tree, and
//! publishes the (optionally rewritten) index next to them. It is used by the
//! `chartmirror` CLI binary and can be driven programmatically with injected
//! collaborators for testing.
//!
//! # Modules
//!
//! - [`acquisition`] - Manifest download into the temporary index file
//! - [`catalog`] - Parsed index entries and the package name newtype
//! - [`cli`] - Command-line argument definitions
//! - [`downloader`] - Archive retrieval under the tolerance policy
//! - [`error`] - Pipeline error taxonomy
//! - [`job`] - Pipeline orchestration and run state
//! - [`layout`] - Local mirror paths and archive path derivation
//! - [`manifest`] - Index parsing into a [`catalog::Catalog`]
//! - [`matcher`] - Loose name matching over a catalog
//! - [`output`] - User-facing progress lines
//! - [`policy`] - Strict and tolerant failure handling
//! - [`publisher`] - Location rewrite and atomic index promotion
//! - [`report`] - Per-archive outcome records
//! - [`repository`] - Repository identity and source URLs
//! - [`selector`] - Selection criteria and exact-match refinement
//! - [`settings`] - Settings file loading and CLI merging
//! - [`transport`] - HTTP retrieval of indexes and archives

pub mod acquisition;
pub mod catalog;
pub mod cli;
pub mod downloader;
pub mod error;
pub mod job;
pub mod layout;
pub mod manifest;
pub mod matcher;
pub mod output;
pub mod policy;
pub mod publisher;
pub mod report;
pub mod repository;
pub mod selector;
pub mod settings;
pub mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
