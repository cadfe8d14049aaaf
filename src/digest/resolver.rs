//! Fetch-with-fallback SHA-256 resolution for a single artifact.
//!
//! The resolver first asks the repository for a published `<artifact>.sha256`
//! file and trusts its contents verbatim. Only when that file is missing
//! (HTTP 404) does it download the artifact itself and hash the stream
//! locally. Which of the two happened is returned as [`DigestProvenance`] so
//! callers can report how much trust was placed in the repository.

use std::fmt;
use std::io;

use log::debug;
use sha2::{Digest, Sha256};

use super::download::ArtifactSource;
use super::error::{DownloadError, ResolveError};
use super::sha256_digest::Sha256Digest;

/// Suffix appended to an artifact URL to locate its published digest.
pub const DIGEST_FILE_SUFFIX: &str = ".sha256";

/// Where a resolved digest came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestProvenance {
    /// The repository published a `.sha256` file and its value was used as-is.
    Published,
    /// No digest file existed; the artifact was downloaded and hashed locally.
    Computed,
}

impl fmt::Display for DigestProvenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Published => write!(f, "pre-computed digest found"),
            Self::Computed => write!(f, "digest computed locally"),
        }
    }
}

/// A successfully resolved digest and how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The artifact's SHA-256 digest.
    pub digest: Sha256Digest,
    /// Whether the digest was published or computed.
    pub provenance: DigestProvenance,
}

/// Resolves artifact digests through an [`ArtifactSource`].
///
/// Each call owns its own hash state; the resolver itself is stateless and
/// may be shared freely across worker threads.
#[derive(Clone, Copy)]
pub struct DigestResolver<'a> {
    source: &'a dyn ArtifactSource,
}

impl<'a> DigestResolver<'a> {
    /// Create a resolver backed by `source`.
    #[must_use]
    pub fn new(source: &'a dyn ArtifactSource) -> Self {
        Self { source }
    }

    /// Resolve the SHA-256 digest of the artifact at `artifact_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Network`] when the digest file request fails
    /// with anything other than 404, or when the fallback download fails.
    /// Returns [`ResolveError::Integrity`] when a published digest file is
    /// not exactly 64 hex characters.
    pub fn resolve(&self, artifact_url: &str) -> Result<Resolution, ResolveError> {
        let digest_url = format!("{artifact_url}{DIGEST_FILE_SUFFIX}");
        match self.source.fetch_digest_file(&digest_url) {
            Ok(body) => {
                let digest = Sha256Digest::from_published(&digest_url, &body)?;
                debug!("using published digest {digest_url}");
                Ok(Resolution {
                    digest,
                    provenance: DigestProvenance::Published,
                })
            }
            Err(DownloadError::NotFound { .. }) => {
                debug!("no digest file at {digest_url}; hashing {artifact_url}");
                let digest = self.download_and_hash(artifact_url)?;
                Ok(Resolution {
                    digest,
                    provenance: DigestProvenance::Computed,
                })
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Stream the artifact through a fresh SHA-256 context.
    fn download_and_hash(&self, artifact_url: &str) -> Result<Sha256Digest, ResolveError> {
        let mut reader = self.source.open_artifact(artifact_url)?;
        let mut hasher = Sha256::new();
        let bytes_read =
            io::copy(&mut reader, &mut hasher).map_err(|source| DownloadError::Read {
                url: artifact_url.to_owned(),
                source,
            })?;
        debug!("hashed {bytes_read} bytes from {artifact_url}");
        Ok(Sha256Digest::from_raw(artifact_url, &hasher.finalize())?)
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
