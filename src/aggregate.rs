//! Component aggregation for resolved artifacts.
//!
//! Artifacts are grouped under their `group:name:version` coordinate. The
//! aggregator owns every [`Component`] for the lifetime of a run and is
//! consumed once when the metadata document is rendered.
//!
//! Artifact order inside a component follows the input ordinal supplied with
//! each record, not the order in which records arrive, so the result does not
//! depend on which resolution finished first.

use std::collections::BTreeMap;
use std::fmt;

use crate::digest::sha256_digest::Sha256Digest;

/// Coordinate identifying a component: `group:name:version`.
///
/// Equality and ordering are exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentKey {
    /// Group identifier, e.g. `com.google.code.gson`.
    pub group: String,
    /// Artifact (module) name, e.g. `gson`.
    pub name: String,
    /// Version string, e.g. `2.8.9`.
    pub version: String,
}

impl ComponentKey {
    /// Build a key from its three parts.
    ///
    /// # Examples
    ///
    /// ```
    /// use verigen::aggregate::ComponentKey;
    ///
    /// let key = ComponentKey::new("com.example", "foo", "1.0");
    /// assert_eq!(key.to_string(), "com.example:foo:1.0");
    /// ```
    #[must_use]
    pub fn new(group: &str, name: &str, version: &str) -> Self {
        Self {
            group: group.to_owned(),
            name: name.to_owned(),
            version: version.to_owned(),
        }
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

/// A single physical file with its trusted digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    filename: String,
    sha256: Sha256Digest,
    origin: String,
}

impl Artifact {
    /// Create an artifact record from a resolved digest.
    #[must_use]
    pub fn new(filename: &str, sha256: Sha256Digest, origin: &str) -> Self {
        Self {
            filename: filename.to_owned(),
            sha256,
            origin: origin.to_owned(),
        }
    }

    /// The file name, e.g. `gson-2.8.9.jar`.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The SHA-256 digest.
    #[must_use]
    pub fn sha256(&self) -> &Sha256Digest {
        &self.sha256
    }

    /// Host name of the repository the digest is attributed to.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

/// A component and its artifacts in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    key: ComponentKey,
    artifacts: Vec<Artifact>,
}

impl Component {
    /// The component coordinate.
    #[must_use]
    pub fn key(&self) -> &ComponentKey {
        &self.key
    }

    /// Artifacts owned by this component.
    #[must_use]
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }
}

/// Outcome of [`Aggregator::record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The artifact was new and has been added.
    Added,
    /// The component already held an artifact with this file name.
    Duplicate,
}

/// Artifacts of one component tagged with their input ordinal.
#[derive(Debug, Default)]
struct Slot {
    entries: Vec<(usize, Artifact)>,
}

/// Builds the component map for one run.
#[derive(Debug, Default)]
pub struct Aggregator {
    components: BTreeMap<ComponentKey, Slot>,
}

impl Aggregator {
    /// Create an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `artifact` under `key`, creating the component if absent.
    ///
    /// `ordinal` is the artifact's position in the input; artifacts are kept
    /// sorted by it. Recording a file name the component already holds is a
    /// no-op apart from keeping the earlier ordinal.
    ///
    /// # Examples
    ///
    /// ```
    /// use verigen::aggregate::{Aggregator, Artifact, ComponentKey, RecordOutcome};
    /// use verigen::digest::sha256_digest::Sha256Digest;
    ///
    /// let key = ComponentKey::new("com.example", "foo", "1.0");
    /// let digest = Sha256Digest::of(b"foo");
    /// let mut aggregator = Aggregator::new();
    ///
    /// let jar = Artifact::new("foo-1.0.jar", digest.clone(), "repo.maven.apache.org");
    /// assert_eq!(aggregator.record(key.clone(), 0, jar.clone()), RecordOutcome::Added);
    /// assert_eq!(aggregator.record(key, 5, jar), RecordOutcome::Duplicate);
    /// assert_eq!(aggregator.artifact_count(), 1);
    /// ```
    pub fn record(
        &mut self,
        key: ComponentKey,
        ordinal: usize,
        artifact: Artifact,
    ) -> RecordOutcome {
        let slot = self.components.entry(key).or_default();
        if let Some(existing) = slot
            .entries
            .iter_mut()
            .find(|(_, held)| held.filename == artifact.filename)
        {
            if ordinal < existing.0 {
                *existing = (ordinal, artifact);
                slot.entries.sort_by_key(|(position, _)| *position);
            }
            return RecordOutcome::Duplicate;
        }
        let at = slot
            .entries
            .partition_point(|(position, _)| *position <= ordinal);
        slot.entries.insert(at, (ordinal, artifact));
        RecordOutcome::Added
    }

    /// Number of distinct components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Return true when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Total number of artifacts across all components.
    #[must_use]
    pub fn artifact_count(&self) -> usize {
        self.components.values().map(|slot| slot.entries.len()).sum()
    }

    /// Consume the aggregator, yielding components sorted by coordinate.
    #[must_use]
    pub fn into_components(self) -> Vec<Component> {
        self.components
            .into_iter()
            .map(|(key, slot)| Component {
                key,
                artifacts: slot.entries.into_iter().map(|(_, a)| a).collect(),
            })
            .collect()
    }
}
