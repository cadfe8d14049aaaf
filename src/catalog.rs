//! Repository catalog mapping log repository names to download locations.
//!
//! Build-tool failure reports name the repository an artifact came from
//! (`from repository MavenRepo`). The catalog turns that name into the base
//! URL artifacts are fetched from and the origin host recorded in the trust
//! metadata.

use std::collections::BTreeMap;

use thiserror::Error;
use url::Url;

const MAVEN_CENTRAL_URL: &str = "https://repo.maven.apache.org/maven2/";
const GOOGLE_URL: &str = "https://dl.google.com/dl/android/maven2/";
const GRADLE_PLUGINS_URL: &str = "https://plugins.gradle.org/m2/";

/// Built-in repositories as `(tag, base URL)` pairs.
pub const BUILTIN_REPOSITORIES: &[(&str, &str)] = &[
    ("MavenRepo", MAVEN_CENTRAL_URL),
    ("MavenLocal", MAVEN_CENTRAL_URL),
    ("Google", GOOGLE_URL),
    ("Gradle Central Plugin Repository", GRADLE_PLUGINS_URL),
];

/// Errors raised when registering a repository.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The repository tag is empty or only whitespace.
    #[error("repository tag must not be empty")]
    EmptyTag,

    /// The base URL is not an absolute HTTP(S) URL with a host.
    #[error("invalid base URL for repository \"{tag}\": {reason}")]
    InvalidBaseUrl {
        /// Tag of the offending repository.
        tag: String,
        /// Description of the validation failure.
        reason: String,
    },
}

/// A repository artifacts can be downloaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    tag: String,
    base_url: String,
    origin: String,
}

impl Repository {
    /// Build a repository entry, normalising the base URL to end in `/`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::EmptyTag`] for a blank tag and
    /// [`CatalogError::InvalidBaseUrl`] when the URL does not parse, is not
    /// `http` or `https`, has no host, or carries a query or fragment.
    ///
    /// # Examples
    ///
    /// ```
    /// use verigen::catalog::Repository;
    ///
    /// let repo = Repository::new("JitPack", "https://jitpack.io").unwrap();
    /// assert_eq!(repo.base_url(), "https://jitpack.io/");
    /// assert_eq!(repo.origin(), "jitpack.io");
    /// ```
    pub fn new(tag: &str, base_url: &str) -> Result<Self, CatalogError> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(CatalogError::EmptyTag);
        }
        let (base_url, origin) =
            parse_base_url(base_url).map_err(|reason| CatalogError::InvalidBaseUrl {
                tag: tag.to_owned(),
                reason,
            })?;
        Ok(Self {
            tag: tag.to_owned(),
            base_url,
            origin,
        })
    }

    /// The repository name as it appears in failure logs.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The base URL, always ending in `/`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The host name recorded as the artifact's origin.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

/// Lookup table from repository tag to [`Repository`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryCatalog {
    entries: BTreeMap<String, Repository>,
}

impl RepositoryCatalog {
    /// Catalog containing only the built-in repositories.
    #[must_use]
    pub fn builtin() -> Self {
        let entries = BUILTIN_REPOSITORIES
            .iter()
            .filter_map(|(tag, url)| Repository::new(tag, url).ok())
            .map(|repo| (repo.tag.clone(), repo))
            .collect();
        Self { entries }
    }

    /// Add or replace a repository.
    pub fn insert(&mut self, repository: Repository) {
        self.entries.insert(repository.tag.clone(), repository);
    }

    /// Look up the repository registered under `tag`.
    ///
    /// Matching is exact and case-sensitive.
    ///
    /// # Examples
    ///
    /// ```
    /// use verigen::catalog::RepositoryCatalog;
    ///
    /// let catalog = RepositoryCatalog::builtin();
    /// let google = catalog.resolve("Google").unwrap();
    /// assert_eq!(google.origin(), "dl.google.com");
    /// assert!(catalog.resolve("google").is_none());
    /// ```
    #[must_use]
    pub fn resolve(&self, tag: &str) -> Option<&Repository> {
        self.entries.get(tag)
    }

    /// Iterate over registered tags in sorted order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl Default for RepositoryCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Parse a repository base URL into its normalised form and origin host.
///
/// The path is given a trailing `/` so artifact paths can be appended.
fn parse_base_url(raw: &str) -> Result<(String, String), String> {
    let raw = raw.trim();
    let mut url = Url::parse(raw).map_err(|e| format!("\"{raw}\" is not a URL: {e}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!(
            "\"{raw}\" must use http or https, not {}",
            url.scheme()
        ));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(format!("\"{raw}\" must not have a query or fragment"));
    }
    let origin = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_owned(),
        _ => return Err(format!("\"{raw}\" has no host")),
    };
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok((url.into(), origin))
}
