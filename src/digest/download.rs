//! Digest-file and artifact retrieval over HTTPS.
//!
//! Provides a trait-based abstraction for fetching published `.sha256`
//! files and streaming artifact bodies, enabling dependency injection for
//! testing. Digest files and artifacts use separate agents because their
//! timeout budgets differ by orders of magnitude.

use std::io::Read;
use std::time::Duration;

use super::error::DownloadError;

/// Upper bound on the bytes read from a digest-file response.
///
/// Anything past 64 bytes is already an integrity failure; the cap only keeps
/// a misbehaving server from streaming an unbounded body into memory.
pub const DIGEST_FILE_READ_LIMIT: u64 = 4096;

/// Trait for fetching digest files and artifact bodies from a repository.
///
/// Abstractions allow tests to mock HTTP behaviour without network access.
/// Implementations are shared across resolver worker threads.
///
/// # Examples
///
/// ```no_run
/// use verigen::digest::download::{ArtifactSource, HttpSource};
///
/// let source = HttpSource::default();
/// let body = source.fetch_digest_file(
///     "https://repo.maven.apache.org/maven2/com/google/code/gson/gson/2.8.9/gson-2.8.9.jar.sha256",
/// );
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArtifactSource: Send + Sync {
    /// Fetch the raw body of a published digest file.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::NotFound`] on HTTP 404 and
    /// [`DownloadError::HttpError`] for any other failure.
    fn fetch_digest_file(&self, url: &str) -> Result<Vec<u8>, DownloadError>;

    /// Open a streaming reader over an artifact body.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::NotFound`] on HTTP 404 and
    /// [`DownloadError::HttpError`] for any other failure.
    fn open_artifact(&self, url: &str) -> Result<Box<dyn Read>, DownloadError>;
}

/// Connect and read budgets for the two request kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Connect timeout for `.sha256` requests.
    pub digest_connect: Duration,
    /// Response and body timeout for `.sha256` requests.
    pub digest_read: Duration,
    /// Connect timeout for artifact downloads.
    pub artifact_connect: Duration,
    /// Response and body timeout for artifact downloads.
    pub artifact_read: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            digest_connect: Duration::from_millis(500),
            digest_read: Duration::from_millis(750),
            artifact_connect: Duration::from_millis(500),
            artifact_read: Duration::from_secs(60),
        }
    }
}

/// HTTP-based source using `ureq`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    digest_agent: ureq::Agent,
    artifact_agent: ureq::Agent,
}

impl HttpSource {
    /// Build a source whose agents honour `timeouts`.
    #[must_use]
    pub fn new(timeouts: &Timeouts) -> Self {
        Self {
            digest_agent: http_agent(timeouts.digest_connect, timeouts.digest_read),
            artifact_agent: http_agent(timeouts.artifact_connect, timeouts.artifact_read),
        }
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new(&Timeouts::default())
    }
}

impl ArtifactSource for HttpSource {
    fn fetch_digest_file(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        let response = self
            .digest_agent
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let mut body = Vec::new();
        response
            .into_body()
            .into_reader()
            .take(DIGEST_FILE_READ_LIMIT)
            .read_to_end(&mut body)
            .map_err(|source| DownloadError::Read {
                url: url.to_owned(),
                source,
            })?;
        Ok(body)
    }

    fn open_artifact(&self, url: &str) -> Result<Box<dyn Read>, DownloadError> {
        let response = self
            .artifact_agent
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        Ok(Box::new(response.into_body().into_reader()))
    }
}

/// Build a `ureq` agent with the given connect and read budgets.
fn http_agent(connect: Duration, read: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_connect(Some(connect))
        .timeout_recv_response(Some(read))
        .timeout_recv_body(Some(read))
        .build();
    ureq::Agent::new_with_config(config)
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        other => DownloadError::HttpError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
