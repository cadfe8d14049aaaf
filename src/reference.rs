//! Artifact reference extraction from dependency-verification failure logs.
//!
//! Gradle lists artifacts that lack verification metadata as lines of the
//! form:
//!
//! ```text
//!     - gson-2.8.9.jar (com.google.code.gson:gson:2.8.9) from repository MavenRepo
//! ```
//!
//! [`parse_line`] classifies every input line as either an artifact
//! reference or a skipped line with a reason. It never fails; malformed
//! input is data, not an error.

use std::fmt;

use crate::aggregate::ComponentKey;
use crate::catalog::{Repository, RepositoryCatalog};

const REPOSITORY_MARKER: &str = ") from repository ";
const COORDINATE_OPEN: &str = " (";

/// One artifact named by a failure-log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactReference {
    /// Physical file name, e.g. `gson-2.8.9.jar`.
    pub filename: String,
    /// Component coordinate the file belongs to.
    pub component: ComponentKey,
    /// Repository the artifact is fetched from.
    pub repository: Repository,
}

impl ArtifactReference {
    /// Canonical download URL for this artifact.
    ///
    /// Dots in the group become path separators:
    /// `<base><group/as/path>/<name>/<version>/<filename>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use verigen::catalog::RepositoryCatalog;
    /// use verigen::reference::{ParsedLine, parse_line};
    ///
    /// let catalog = RepositoryCatalog::builtin();
    /// let line = "    - foo-1.0.jar (com.example:foo:1.0) from repository MavenRepo";
    /// let ParsedLine::Artifact(reference) = parse_line(line, &catalog) else {
    ///     panic!("expected an artifact line");
    /// };
    /// assert_eq!(
    ///     reference.artifact_url(),
    ///     "https://repo.maven.apache.org/maven2/com/example/foo/1.0/foo-1.0.jar"
    /// );
    /// ```
    #[must_use]
    pub fn artifact_url(&self) -> String {
        format!(
            "{}{}/{}/{}/{}",
            self.repository.base_url(),
            self.component.group.replace('.', "/"),
            self.component.name,
            self.component.version,
            self.filename
        )
    }
}

impl fmt::Display for ArtifactReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.filename, self.component)
    }
}

/// Why a line was not treated as an artifact reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The line is empty or only whitespace.
    Blank,
    /// The line does not have the `<file> (<g>:<n>:<v>) from repository <tag>` shape.
    NotAnArtifactLine,
    /// The coordinate is not exactly three non-empty colon-separated tokens.
    MalformedCoordinate {
        /// The text found between the parentheses.
        coordinate: String,
    },
    /// The repository tag is not in the catalog.
    UnknownRepository {
        /// The unrecognised tag.
        tag: String,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blank => write!(f, "blank line"),
            Self::NotAnArtifactLine => write!(f, "not an artifact line"),
            Self::MalformedCoordinate { coordinate } => {
                write!(f, "malformed coordinate \"{coordinate}\"")
            }
            Self::UnknownRepository { tag } => write!(f, "unknown repository \"{tag}\""),
        }
    }
}

/// Classification of a single input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// The line names an artifact in a known repository.
    Artifact(ArtifactReference),
    /// The line was skipped.
    Skipped(SkipReason),
}

/// Classify `line` against the repository `catalog`.
///
/// Indentation and the leading `-` are cosmetic. The file name is the token
/// immediately before ` (`; group, name, and version are the three
/// colon-separated tokens inside the parentheses; the repository tag is
/// everything after `from repository ` up to the end of the line.
#[must_use]
pub fn parse_line(line: &str, catalog: &RepositoryCatalog) -> ParsedLine {
    match split_line(line) {
        Ok(raw) => match catalog.resolve(raw.tag) {
            Some(repository) => ParsedLine::Artifact(ArtifactReference {
                filename: raw.filename.to_owned(),
                component: raw.component,
                repository: repository.clone(),
            }),
            None => ParsedLine::Skipped(SkipReason::UnknownRepository {
                tag: raw.tag.to_owned(),
            }),
        },
        Err(reason) => ParsedLine::Skipped(reason),
    }
}

/// Fields of an artifact line before the repository tag is looked up.
struct RawReference<'a> {
    filename: &'a str,
    component: ComponentKey,
    tag: &'a str,
}

fn split_line(line: &str) -> Result<RawReference<'_>, SkipReason> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(SkipReason::Blank);
    }
    let body = trimmed
        .strip_prefix('-')
        .map_or(trimmed, str::trim_start);

    let (head, tag) = body
        .rsplit_once(REPOSITORY_MARKER)
        .ok_or(SkipReason::NotAnArtifactLine)?;
    let tag = tag.trim();
    let (before_paren, coordinate) = head
        .rsplit_once(COORDINATE_OPEN)
        .ok_or(SkipReason::NotAnArtifactLine)?;
    let filename = before_paren
        .split_whitespace()
        .next_back()
        .ok_or(SkipReason::NotAnArtifactLine)?;
    if tag.is_empty() {
        return Err(SkipReason::NotAnArtifactLine);
    }

    let component = split_coordinate(coordinate).ok_or_else(|| {
        SkipReason::MalformedCoordinate {
            coordinate: coordinate.to_owned(),
        }
    })?;
    Ok(RawReference {
        filename,
        component,
        tag,
    })
}

/// Split `group:name:version`, requiring exactly three clean tokens.
fn split_coordinate(coordinate: &str) -> Option<ComponentKey> {
    let mut parts = coordinate.split(':');
    let group = parts.next()?;
    let name = parts.next()?;
    let version = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    let is_token = |s: &str| !s.is_empty() && !s.contains(char::is_whitespace);
    if !(is_token(group) && is_token(name) && is_token(version)) {
        return None;
    }
    Some(ComponentKey::new(group, name, version))
}

#[cfg(test)]
#[path = "reference_tests.rs"]
mod tests;
