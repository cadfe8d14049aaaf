//! Shared test utilities for the generator crate.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::{Mutex, PoisonError};

use crate::digest::download::ArtifactSource;
use crate::digest::error::DownloadError;
use crate::digest::resolver::DIGEST_FILE_SUFFIX;
use crate::digest::sha256_digest::Sha256Digest;

/// Hex-encoded SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256Digest::of(bytes).into_inner()
}

/// Canned response for one URL.
#[derive(Debug, Clone)]
enum StubResponse {
    Body(Vec<u8>),
    Fail(String),
}

/// An in-memory [`ArtifactSource`].
///
/// Responses are registered per artifact URL. Any URL without a registered
/// response answers with [`DownloadError::NotFound`], so an artifact with only
/// a body registered exercises the hash-locally fallback. Every request is
/// recorded and can be inspected with [`StubSource::requests`].
#[derive(Debug, Default)]
pub struct StubSource {
    digest_files: HashMap<String, StubResponse>,
    artifacts: HashMap<String, StubResponse>,
    requests: Mutex<Vec<String>>,
}

impl StubSource {
    /// Create a source that answers 404 for everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `body` as the `.sha256` file for `artifact_url`.
    #[must_use]
    pub fn with_digest_file(mut self, artifact_url: &str, body: &str) -> Self {
        self.digest_files.insert(
            digest_url(artifact_url),
            StubResponse::Body(body.as_bytes().to_vec()),
        );
        self
    }

    /// Make the `.sha256` request for `artifact_url` fail with `reason`.
    #[must_use]
    pub fn with_digest_failure(mut self, artifact_url: &str, reason: &str) -> Self {
        self.digest_files.insert(
            digest_url(artifact_url),
            StubResponse::Fail(reason.to_owned()),
        );
        self
    }

    /// Serve `bytes` as the body of `artifact_url`.
    #[must_use]
    pub fn with_artifact(mut self, artifact_url: &str, bytes: &[u8]) -> Self {
        self.artifacts
            .insert(artifact_url.to_owned(), StubResponse::Body(bytes.to_vec()));
        self
    }

    /// Make the download of `artifact_url` fail with `reason`.
    #[must_use]
    pub fn with_artifact_failure(mut self, artifact_url: &str, reason: &str) -> Self {
        self.artifacts
            .insert(artifact_url.to_owned(), StubResponse::Fail(reason.to_owned()));
        self
    }

    /// Every URL requested so far, in request order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of times `url` was requested.
    #[must_use]
    pub fn request_count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|requested| requested.as_str() == url)
            .count()
    }

    fn respond(
        &self,
        table: &HashMap<String, StubResponse>,
        url: &str,
    ) -> Result<Vec<u8>, DownloadError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_owned());
        match table.get(url) {
            Some(StubResponse::Body(bytes)) => Ok(bytes.clone()),
            Some(StubResponse::Fail(reason)) => Err(DownloadError::HttpError {
                url: url.to_owned(),
                reason: reason.clone(),
            }),
            None => Err(DownloadError::NotFound {
                url: url.to_owned(),
            }),
        }
    }
}

impl ArtifactSource for StubSource {
    fn fetch_digest_file(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        self.respond(&self.digest_files, url)
    }

    fn open_artifact(&self, url: &str) -> Result<Box<dyn Read>, DownloadError> {
        let bytes = self.respond(&self.artifacts, url)?;
        Ok(Box::new(Cursor::new(bytes)))
    }
}

fn digest_url(artifact_url: &str) -> String {
    format!("{artifact_url}{DIGEST_FILE_SUFFIX}")
}
