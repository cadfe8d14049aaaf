//! Verification-metadata generator library.
//!
//! Turns the artifact lines of a Gradle dependency-verification failure log
//! into `<component>` entries for `verification-metadata.xml`. Each
//! artifact's SHA-256 comes from the digest file its repository publishes or,
//! when there is none, from downloading and hashing the artifact. It is used
//! by the `verigen` binary and can be driven directly with a custom
//! [`digest::download::ArtifactSource`].
//!
//! # Modules
//!
//! - [`aggregate`] - Component keys, artifacts, and the per-run aggregator
//! - [`catalog`] - Repository names mapped to base URLs and origin hosts
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - TOML configuration file
//! - [`digest`] - Digest download, validation, and fetch-with-fallback resolution
//! - [`error`] - Run-level error types
//! - [`metadata`] - Rendering of the verification-metadata document
//! - [`output`] - Progress and trust-signal lines for stderr
//! - [`pipeline`] - Parse, resolve, and aggregate orchestration
//! - [`reference`] - Failure-log line classification

pub mod aggregate;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod digest;
pub mod error;
pub mod metadata;
pub mod output;
pub mod pipeline;
pub mod reference;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
