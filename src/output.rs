//! User-facing progress lines written to stderr.
//!
//! The metadata document is the only thing written to stdout. Everything a
//! user reads while a run is in progress goes through [`write_stderr_line`],
//! so callers can capture it in tests by passing a `Vec<u8>`.

use std::fmt::Display;
use std::io::Write;

use crate::digest::resolver::DigestProvenance;

/// Write `message` and a newline to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Trust-signal line for one resolved artifact: provenance, a tab, the URL.
///
/// # Examples
///
/// ```
/// use verigen::digest::resolver::DigestProvenance;
/// use verigen::output::provenance_line;
///
/// assert_eq!(
///     provenance_line(DigestProvenance::Published, "https://example.test/a.jar"),
///     "pre-computed digest found\thttps://example.test/a.jar"
/// );
/// ```
#[must_use]
pub fn provenance_line(provenance: DigestProvenance, artifact_url: &str) -> String {
    format!("{provenance}\t{artifact_url}")
}

/// Message for an input line that was not turned into an artifact.
#[must_use]
pub fn skipped_line_message(line_number: usize, reason: impl Display) -> String {
    format!("skipping line {line_number}: {reason}")
}

/// Message for an artifact omitted under `--keep-going`.
#[must_use]
pub fn omitted_artifact_message(reference: impl Display, error: impl Display) -> String {
    format!("omitting {reference}: {error}")
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Distinct components in the document.
    pub components: usize,
    /// Artifacts whose digest came from a published `.sha256` file.
    pub published: usize,
    /// Artifacts hashed locally.
    pub computed: usize,
    /// Artifacts omitted after a network failure.
    pub omitted: usize,
}

/// Format the closing summary line.
///
/// # Examples
///
/// ```
/// use verigen::output::{RunSummary, summary_message};
///
/// let summary = RunSummary { components: 1, published: 2, computed: 1, omitted: 0 };
/// assert_eq!(
///     summary_message(&summary),
///     "Resolved 3 artifacts in 1 component: 2 pre-computed, 1 computed locally"
/// );
/// ```
#[must_use]
pub fn summary_message(summary: &RunSummary) -> String {
    let artifacts = summary.published + summary.computed;
    let mut message = format!(
        "Resolved {artifacts} {} in {} {}: {} pre-computed, {} computed locally",
        plural(artifacts, "artifact", "artifacts"),
        summary.components,
        plural(summary.components, "component", "components"),
        summary.published,
        summary.computed,
    );
    if summary.omitted > 0 {
        message.push_str(&format!("; {} omitted", summary.omitted));
    }
    message
}

const fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}
