//! TOML configuration for a generator run.
//!
//! Every field is optional. Values are deserialised from the file named by
//! `--config` when present and fall back to defaults otherwise; command-line
//! flags are layered on top by the binary.
//!
//! ```toml
//! jobs = 8
//! keep_going = false
//!
//! [timeouts]
//! digest_connect_ms = 500
//! digest_read_ms = 750
//! artifact_connect_ms = 500
//! artifact_read_ms = 60000
//!
//! [[repositories]]
//! tag = "JitPack"
//! url = "https://jitpack.io/"
//! ```

use std::num::NonZeroUsize;
use std::time::Duration;

use camino::Utf8Path;
use serde::Deserialize;

use crate::catalog::{Repository, RepositoryCatalog};
use crate::digest::download::Timeouts;
use crate::error::{GeneratorError, Result};

/// Settings shared by the pipeline and the HTTP source.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Maximum number of artifacts resolved concurrently.
    ///
    /// This bounds the number of in-flight requests against the remote
    /// repositories, not just local CPU use.
    #[serde(default = "GeneratorConfig::default_jobs")]
    pub jobs: NonZeroUsize,
    /// Omit artifacts whose digest cannot be fetched instead of failing the
    /// run. Integrity failures still end the run.
    pub keep_going: bool,
    /// Network timeouts in milliseconds.
    pub timeouts: TimeoutConfig,
    /// Repositories added to, or overriding, the built-in catalog.
    pub repositories: Vec<RepositoryConfig>,
}

impl GeneratorConfig {
    fn default_jobs() -> NonZeroUsize {
        NonZeroUsize::new(8).unwrap_or(NonZeroUsize::MIN)
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::Config`] for malformed TOML, unknown keys,
    /// or `jobs = 0`.
    ///
    /// # Examples
    ///
    /// ```
    /// use verigen::config::GeneratorConfig;
    ///
    /// let config = GeneratorConfig::from_toml_str("jobs = 2\nkeep_going = true\n").unwrap();
    /// assert_eq!(config.jobs.get(), 2);
    /// assert!(config.keep_going);
    /// assert!(config.repositories.is_empty());
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| GeneratorError::Config {
            reason: e.to_string(),
        })
    }

    /// Load configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::ReadInput`] when the file cannot be read and
    /// [`GeneratorError::Config`] when it cannot be parsed.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| GeneratorError::ReadInput {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Build the repository catalog: built-ins plus configured entries.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::InvalidRepository`] when a configured entry
    /// has a blank tag or an unusable URL.
    pub fn catalog(&self) -> Result<RepositoryCatalog> {
        let mut catalog = RepositoryCatalog::builtin();
        for entry in &self.repositories {
            catalog.insert(Repository::new(&entry.tag, &entry.url)?);
        }
        Ok(catalog)
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            jobs: Self::default_jobs(),
            keep_going: false,
            timeouts: TimeoutConfig::default(),
            repositories: Vec::new(),
        }
    }
}

/// Connect and read timeouts, in milliseconds.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutConfig {
    /// Connect timeout for `.sha256` requests.
    pub digest_connect_ms: u64,
    /// Read timeout for `.sha256` requests.
    pub digest_read_ms: u64,
    /// Connect timeout for artifact downloads.
    pub artifact_connect_ms: u64,
    /// Read timeout for artifact downloads.
    pub artifact_read_ms: u64,
}

impl TimeoutConfig {
    /// Convert to the durations used by the HTTP source.
    #[must_use]
    pub const fn to_timeouts(&self) -> Timeouts {
        Timeouts {
            digest_connect: Duration::from_millis(self.digest_connect_ms),
            digest_read: Duration::from_millis(self.digest_read_ms),
            artifact_connect: Duration::from_millis(self.artifact_connect_ms),
            artifact_read: Duration::from_millis(self.artifact_read_ms),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        let defaults = Timeouts::default();
        Self {
            digest_connect_ms: millis(defaults.digest_connect),
            digest_read_ms: millis(defaults.digest_read),
            artifact_connect_ms: millis(defaults.artifact_connect),
            artifact_read_ms: millis(defaults.artifact_read),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// An extra repository entry.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Repository name as printed in failure logs.
    pub tag: String,
    /// Base URL artifacts are laid out under.
    pub url: String,
}
