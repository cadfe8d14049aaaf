//! End-to-end runs over captured build failure logs.

use std::io::{Cursor, Read};
use std::num::NonZeroUsize;

use rstest::rstest;
use verigen::catalog::RepositoryCatalog;
use verigen::digest::download::ArtifactSource;
use verigen::digest::error::DownloadError;
use verigen::pipeline::{PipelineOptions, RunReport, run_pipeline};
use verigen::reference::SkipReason;
use verigen::test_utils::sha256_hex;

const ANDROID_LOG: &str = include_str!("fixtures/android_build.log");
const PLUGIN_LOG: &str = include_str!("fixtures/plugin_build.log");

/// Publishes a digest for `.pom` files and serves every other artifact
/// without one, so both resolution paths run.
struct PomDigestsOnly;

impl ArtifactSource for PomDigestsOnly {
    fn fetch_digest_file(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        if url.ends_with(".pom.sha256") {
            Ok(sha256_hex(url.as_bytes()).into_bytes())
        } else {
            Err(DownloadError::NotFound {
                url: url.to_owned(),
            })
        }
    }

    fn open_artifact(&self, url: &str) -> Result<Box<dyn Read>, DownloadError> {
        Ok(Box::new(Cursor::new(url.as_bytes().to_vec())))
    }
}

fn generate(input: &str, jobs: usize) -> (RunReport, String) {
    let mut stderr = Vec::new();
    let report = run_pipeline(
        input,
        &RepositoryCatalog::builtin(),
        &PomDigestsOnly,
        PipelineOptions {
            jobs: NonZeroUsize::new(jobs).expect("non-zero jobs"),
            ..PipelineOptions::default()
        },
        &mut stderr,
    )
    .expect("pipeline succeeds");
    (report, String::from_utf8(stderr).expect("stderr was not UTF-8"))
}

#[test]
fn android_log_groups_artifacts_into_components() {
    let (report, _) = generate(ANDROID_LOG, 4);

    assert_eq!(report.components.len(), 13);
    let artifacts: usize = report
        .components
        .iter()
        .map(|component| component.artifacts().len())
        .sum();
    assert_eq!(artifacts, 25);
    assert_eq!(report.summary.published + report.summary.computed, 25);
}

#[test]
fn android_log_reports_only_non_blank_skips() {
    let (report, stderr) = generate(ANDROID_LOG, 4);

    let reported: Vec<usize> = report
        .skipped
        .iter()
        .filter(|skip| skip.reason != SkipReason::Blank)
        .map(|skip| skip.line_number)
        .collect();
    assert_eq!(reported, [1, 2, 3, 28, 33]);
    assert_eq!(stderr.matches("skipping line").count(), 5);
}

#[test]
fn trust_signal_distinguishes_published_from_computed() {
    let (report, stderr) = generate(ANDROID_LOG, 4);

    let published = stderr
        .lines()
        .filter(|line| line.starts_with("pre-computed digest found\t"))
        .count();
    let computed = stderr
        .lines()
        .filter(|line| line.starts_with("digest computed locally\t"))
        .count();
    assert_eq!(published, report.summary.published);
    assert_eq!(computed, report.summary.computed);
    assert!(stderr.lines().all(|line| {
        !line.starts_with("pre-computed") || line.ends_with(".pom")
    }));
}

#[test]
fn plugin_log_covers_every_builtin_repository() {
    let (report, stderr) = generate(PLUGIN_LOG, 2);

    let origins: Vec<&str> = report
        .components
        .iter()
        .flat_map(|component| component.artifacts())
        .map(|artifact| artifact.origin())
        .collect();
    assert!(origins.contains(&"plugins.gradle.org"));
    assert!(origins.contains(&"repo.maven.apache.org"));
    assert_eq!(origins.len(), 4);
    assert!(stderr.contains("skipping line 5: unknown repository \"JitPack\""));
}

#[rstest]
#[case::android(ANDROID_LOG)]
#[case::plugin(PLUGIN_LOG)]
fn document_is_identical_for_any_pool_size(#[case] input: &str) {
    let (sequential, _) = generate(input, 1);
    let (parallel, _) = generate(input, 16);
    assert_eq!(sequential.render(), parallel.render());
}
