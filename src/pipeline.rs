//! Pipeline driver: failure log in, aggregated components out.
//!
//! The run has three phases:
//!
//! 1. Every input line is classified by [`parse_line`]. Skipped lines are
//!    reported, and repeated `(coordinate, filename)` pairs are dropped so
//!    each distinct artifact is fetched once.
//! 2. Digests are resolved on a bounded worker pool. Results are collected
//!    in input order, so nothing downstream observes completion order. Once
//!    an artifact fails in a way that ends the run, artifacts after it in
//!    input order are not started.
//! 3. Results are reported and aggregated on the calling thread, in input
//!    order.
//!
//! A network failure aborts the run unless `keep_going` is set, in which
//! case the artifact is omitted. An integrity failure always aborts.

use std::collections::HashSet;
use std::io::Write;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, trace, warn};
use rayon::prelude::*;

use crate::aggregate::{Aggregator, Artifact, Component, ComponentKey, RecordOutcome};
use crate::catalog::RepositoryCatalog;
use crate::digest::download::ArtifactSource;
use crate::digest::error::ResolveError;
use crate::digest::resolver::{DigestProvenance, DigestResolver, Resolution};
use crate::error::{GeneratorError, Result};
use crate::metadata;
use crate::output::{
    RunSummary, omitted_artifact_message, provenance_line, skipped_line_message, summary_message,
    write_stderr_line,
};
use crate::reference::{ArtifactReference, ParsedLine, SkipReason, parse_line};

/// Knobs for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Size of the resolver worker pool.
    pub jobs: NonZeroUsize,
    /// Omit artifacts that hit a network failure instead of aborting.
    pub keep_going: bool,
    /// Suppress progress lines.
    pub quiet: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            jobs: NonZeroUsize::new(8).unwrap_or(NonZeroUsize::MIN),
            keep_going: false,
            quiet: false,
        }
    }
}

/// An input line that did not produce an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// One-based line number in the input.
    pub line_number: usize,
    /// Why the line was skipped.
    pub reason: SkipReason,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Aggregated components, sorted by coordinate.
    pub components: Vec<Component>,
    /// Lines that were not artifact references.
    pub skipped: Vec<SkippedLine>,
    /// Counts for the closing summary.
    pub summary: RunSummary,
}

impl RunReport {
    /// Render the verification-metadata document.
    #[must_use]
    pub fn render(&self) -> String {
        metadata::render(&self.components)
    }
}

/// Run the pipeline over the full text of a failure log.
///
/// Progress is written to `stderr`; the metadata document is not written
/// anywhere and is available through [`RunReport::render`].
///
/// # Errors
///
/// Returns [`GeneratorError::WorkerPool`] when the resolver pool cannot be
/// started, [`GeneratorError::Integrity`] for the first integrity failure in
/// input order, and [`GeneratorError::Resolution`] for the first network
/// failure when `keep_going` is off.
///
/// # Examples
///
/// ```
/// use std::io::Read;
///
/// use verigen::catalog::RepositoryCatalog;
/// use verigen::digest::download::ArtifactSource;
/// use verigen::digest::error::DownloadError;
/// use verigen::pipeline::{PipelineOptions, run_pipeline};
///
/// struct Zeroes;
///
/// impl ArtifactSource for Zeroes {
///     fn fetch_digest_file(&self, _url: &str) -> Result<Vec<u8>, DownloadError> {
///         Ok(vec![b'0'; 64])
///     }
///
///     fn open_artifact(&self, url: &str) -> Result<Box<dyn Read>, DownloadError> {
///         Err(DownloadError::NotFound { url: url.to_owned() })
///     }
/// }
///
/// let input = "    - foo-1.0.jar (com.example:foo:1.0) from repository MavenRepo\n";
/// let mut stderr = Vec::new();
/// let report = run_pipeline(
///     input,
///     &RepositoryCatalog::builtin(),
///     &Zeroes,
///     PipelineOptions::default(),
///     &mut stderr,
/// )
/// .unwrap();
///
/// assert!(report.render().contains(r#"<artifact name="foo-1.0.jar">"#));
/// assert!(String::from_utf8(stderr).unwrap().starts_with("pre-computed digest found"));
/// ```
pub fn run_pipeline(
    input: &str,
    catalog: &RepositoryCatalog,
    source: &dyn ArtifactSource,
    options: PipelineOptions,
    stderr: &mut dyn Write,
) -> Result<RunReport> {
    let (references, skipped) = collect_references(input, catalog, options.quiet, stderr);
    debug!(
        "{} distinct artifact(s), {} skipped line(s); repositories: {}",
        references.len(),
        skipped.len(),
        catalog.tags().collect::<Vec<_>>().join(", ")
    );

    let outcomes = resolve_all(&references, source, options)?;

    let mut aggregator = Aggregator::new();
    let mut summary = RunSummary::default();
    for (ordinal, (reference, outcome)) in references.iter().zip(outcomes).enumerate() {
        // Only artifacts after the first run-ending failure are cancelled, and
        // the loop returns at that failure before reaching them.
        let Some(outcome) = outcome else {
            continue;
        };
        match outcome {
            Ok(resolution) => {
                if !options.quiet {
                    write_stderr_line(
                        stderr,
                        provenance_line(resolution.provenance, &reference.artifact_url()),
                    );
                }
                record_resolution(&mut aggregator, &mut summary, ordinal, reference, resolution);
            }
            Err(ResolveError::Integrity(source)) => {
                return Err(GeneratorError::Integrity {
                    reference: reference.to_string(),
                    source,
                });
            }
            Err(ResolveError::Network(source)) if options.keep_going => {
                warn!("omitting {reference}: {source}");
                write_stderr_line(stderr, omitted_artifact_message(reference, &source));
                summary.omitted += 1;
            }
            Err(ResolveError::Network(source)) => {
                return Err(GeneratorError::Resolution {
                    reference: reference.to_string(),
                    source,
                });
            }
        }
    }

    if aggregator.is_empty() {
        debug!("no artifacts resolved");
    } else {
        debug!(
            "aggregated {} artifact(s) into {} component(s)",
            aggregator.artifact_count(),
            aggregator.len()
        );
    }
    summary.components = aggregator.len();
    if !options.quiet {
        write_stderr_line(stderr, summary_message(&summary));
    }
    Ok(RunReport {
        components: aggregator.into_components(),
        skipped,
        summary,
    })
}

/// Classify every line, report skips, and drop repeated artifacts.
fn collect_references(
    input: &str,
    catalog: &RepositoryCatalog,
    quiet: bool,
    stderr: &mut dyn Write,
) -> (Vec<ArtifactReference>, Vec<SkippedLine>) {
    let mut seen: HashSet<(ComponentKey, String)> = HashSet::new();
    let mut references = Vec::new();
    let mut skipped = Vec::new();

    for (index, line) in input.lines().enumerate() {
        let line_number = index + 1;
        match parse_line(line, catalog) {
            ParsedLine::Artifact(reference) => {
                let identity = (reference.component.clone(), reference.filename.clone());
                if seen.insert(identity) {
                    references.push(reference);
                } else {
                    debug!("line {line_number}: {reference} already queued");
                }
            }
            ParsedLine::Skipped(SkipReason::Blank) => {
                trace!("line {line_number}: blank");
                skipped.push(SkippedLine {
                    line_number,
                    reason: SkipReason::Blank,
                });
            }
            ParsedLine::Skipped(reason) => {
                if !quiet {
                    write_stderr_line(stderr, skipped_line_message(line_number, &reason));
                }
                skipped.push(SkippedLine {
                    line_number,
                    reason,
                });
            }
        }
    }
    (references, skipped)
}

/// Outcome of one resolution; `None` when it was cancelled.
type Outcome = Option<std::result::Result<Resolution, ResolveError>>;

/// Resolve every reference on a pool of `options.jobs` threads.
///
/// The returned vector is index-aligned with `references`. When a failure
/// would end the run, references after it in input order are not started
/// and come back as `None`. References before it always run, so the first
/// failure in input order is the same for any pool size.
fn resolve_all(
    references: &[ArtifactReference],
    source: &dyn ArtifactSource,
    options: PipelineOptions,
) -> Result<Vec<Outcome>> {
    let jobs = options.jobs.get();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .thread_name(|index| format!("verigen-resolve-{index}"))
        .build()
        .map_err(|e| GeneratorError::WorkerPool {
            threads: jobs,
            reason: e.to_string(),
        })?;

    let resolver = DigestResolver::new(source);
    let first_halt = AtomicUsize::new(usize::MAX);
    Ok(pool.install(|| {
        references
            .par_iter()
            .enumerate()
            .map(|(index, reference)| {
                if index > first_halt.load(Ordering::Relaxed) {
                    trace!("not resolving {reference}: an earlier artifact failed");
                    return None;
                }
                let outcome = resolver.resolve(&reference.artifact_url());
                if outcome
                    .as_ref()
                    .is_err_and(|err| ends_run(err, options.keep_going))
                {
                    first_halt.fetch_min(index, Ordering::Relaxed);
                }
                Some(outcome)
            })
            .collect()
    }))
}

/// Whether `err` aborts the run under the given policy.
fn ends_run(err: &ResolveError, keep_going: bool) -> bool {
    err.is_fatal() || !keep_going
}

fn record_resolution(
    aggregator: &mut Aggregator,
    summary: &mut RunSummary,
    ordinal: usize,
    reference: &ArtifactReference,
    resolution: Resolution,
) {
    let artifact = Artifact::new(
        &reference.filename,
        resolution.digest,
        reference.repository.origin(),
    );
    let outcome = aggregator.record(reference.component.clone(), ordinal, artifact);
    if outcome == RecordOutcome::Duplicate {
        return;
    }
    match resolution.provenance {
        DigestProvenance::Published => summary.published += 1,
        DigestProvenance::Computed => summary.computed += 1,
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
