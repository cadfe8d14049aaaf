//! Error types for the verification-metadata generator.
//!
//! Network and integrity failures raised while resolving a single artifact
//! live in [`crate::digest::error`]; this module wraps them with the artifact
//! they concern and adds the run-level failures (input, configuration,
//! output).

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::digest::error::{DownloadError, IntegrityError};

/// Errors that end a generator run.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input log or configuration file could not be read.
    #[error("failed to read {path}")]
    ReadInput {
        /// Path of the unreadable file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is malformed or contains invalid values.
    #[error("invalid configuration: {reason}")]
    Config {
        /// Description of the parse or validation failure.
        reason: String,
    },

    /// A configured repository entry was rejected.
    #[error(transparent)]
    InvalidRepository(#[from] CatalogError),

    /// The resolver worker pool could not be started.
    #[error("failed to start {threads} resolver thread(s): {reason}")]
    WorkerPool {
        /// Requested pool size.
        threads: usize,
        /// Description of the failure.
        reason: String,
    },

    /// A digest could not be obtained because of a network failure.
    #[error("could not resolve {reference}; rerun with --keep-going to omit it")]
    Resolution {
        /// The artifact being resolved, as `file (group:name:version)`.
        reference: String,
        /// The underlying download failure.
        #[source]
        source: DownloadError,
    },

    /// A digest was obtained but failed validation.
    #[error("integrity check failed for {reference}")]
    Integrity {
        /// The artifact being resolved, as `file (group:name:version)`.
        reference: String,
        /// The underlying validation failure.
        #[source]
        source: IntegrityError,
    },

    /// Failed to write the metadata document.
    #[error("failed to write output to {target}")]
    WriteFailed {
        /// Destination description (`stdout` or a path).
        target: String,
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },
}

impl GeneratorError {
    /// Render the error and its source chain on one line.
    ///
    /// # Examples
    ///
    /// ```
    /// use verigen::digest::error::DownloadError;
    /// use verigen::error::GeneratorError;
    ///
    /// let err = GeneratorError::Resolution {
    ///     reference: "foo-1.0.jar (com.example:foo:1.0)".to_owned(),
    ///     source: DownloadError::NotFound { url: "https://example.test/foo-1.0.jar".to_owned() },
    /// };
    /// let text = err.chain_message();
    /// assert!(text.starts_with("could not resolve foo-1.0.jar"));
    /// assert!(text.contains("https://example.test/foo-1.0.jar"));
    /// ```
    #[must_use]
    pub fn chain_message(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

/// Result type alias using [`GeneratorError`].
pub type Result<T> = std::result::Result<T, GeneratorError>;
