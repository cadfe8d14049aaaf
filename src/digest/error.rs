//! Error types for digest downloads and verification.
//!
//! Network failures and integrity failures are kept apart: the former are
//! scoped to a single artifact and may be skipped, the latter mean a digest
//! file or the local hash computation cannot be trusted and always end the
//! run.

use thiserror::Error;

/// Errors arising from fetching digest files or artifact bodies.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// HTTP request failed with a status other than 404, or never completed.
    #[error("download failed for {url}: {reason}")]
    HttpError {
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

    /// The response body could not be read to completion.
    #[error("failed reading response body from {url}")]
    Read {
        /// The URL whose body was being read.
        url: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors indicating that a digest value cannot be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    /// A published digest file did not contain exactly 64 characters.
    #[error("digest file {url} has {actual} bytes; expected exactly {expected}")]
    DigestFileLength {
        /// The digest file URL.
        url: String,
        /// Number of bytes required.
        expected: usize,
        /// Number of bytes received.
        actual: usize,
    },

    /// A published digest file had the right length but invalid content.
    #[error("digest file {url} is malformed: {reason}")]
    MalformedDigestFile {
        /// The digest file URL.
        url: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// A locally computed digest had an unexpected byte length.
    #[error("computed digest for {url} is {actual} bytes; expected {expected}")]
    ComputedDigestLength {
        /// The artifact URL that was hashed.
        url: String,
        /// Number of bytes required.
        expected: usize,
        /// Number of bytes produced.
        actual: usize,
    },
}

/// Failure to resolve the digest for one artifact.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Neither the digest file nor the artifact could be fetched.
    #[error(transparent)]
    Network(#[from] DownloadError),

    /// A digest was obtained but failed integrity checks.
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

impl ResolveError {
    /// Return true when this failure must abort the whole run.
    ///
    /// Integrity failures are never recoverable; network failures are
    /// scoped to a single artifact.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Integrity(_))
    }
}
