//! Verification-metadata generator CLI entrypoint.
//!
//! Reads a build failure log, resolves a digest for every artifact it names,
//! and writes the resulting `<component>` entries to stdout or `--output`.
//! Progress and trust signals go to stderr.

use std::io::{Read, Write};

use camino::Utf8Path;
use clap::Parser;
use tracing_subscriber::{EnvFilter, prelude::*};
use verigen::cli::Cli;
use verigen::config::GeneratorConfig;
use verigen::digest::download::HttpSource;
use verigen::error::{GeneratorError, Result};
use verigen::output::write_stderr_line;
use verigen::pipeline::run_pipeline;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    init_logging(cli.verbosity, &mut stderr);
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    // Step 1: Load configuration and merge flags over it
    let config = match cli.config.as_deref() {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };
    let options = cli.pipeline_options(&config);
    let catalog = config.catalog()?;

    // Step 2: Read the whole log before producing any output
    let input = read_input(cli.input_path())?;

    // Step 3: Resolve and aggregate
    let source = HttpSource::new(&config.timeouts.to_timeouts());
    let report = run_pipeline(&input, &catalog, &source, options, stderr)?;

    // Step 4: Emit the document
    write_document(cli.output.as_deref(), &report.render())
}

fn read_input(path: Option<&Utf8Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path).map_err(|source| GeneratorError::ReadInput {
            path: path.to_owned(),
            source,
        }),
        None => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}

fn write_document(path: Option<&Utf8Path>, document: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, document).map_err(|source| GeneratorError::WriteFailed {
                target: path.to_string(),
                source,
            })
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(document.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(|source| GeneratorError::WriteFailed {
                    target: "stdout".to_owned(),
                    source,
                })
        }
    }
}

/// Install the global subscriber; `log` records reach it through the bridge.
fn init_logging(verbosity: u8, stderr: &mut dyn Write) {
    let filter = if std::env::var_os("RUST_LOG").is_some() {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(err) => {
                write_stderr_line(stderr, format!("ignoring invalid RUST_LOG: {err}"));
                EnvFilter::new(log_directive(verbosity))
            }
        }
    } else {
        EnvFilter::new(log_directive(verbosity))
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
    if installed.is_err() {
        // A subscriber is already installed; keep it.
    }
}

fn log_directive(verbosity: u8) -> String {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!("error,verigen={level}")
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {}", err.chain_message()));
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use rstest::rstest;
    use verigen::digest::error::DownloadError;

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_chain_and_returns_one() {
        let err = GeneratorError::Resolution {
            reference: "foo-1.0.jar (com.example:foo:1.0)".to_owned(),
            source: DownloadError::HttpError {
                url: "https://repo.maven.apache.org/maven2/com/example/foo/1.0/foo-1.0.jar.sha256"
                    .to_owned(),
                reason: "connection refused".to_owned(),
            },
        };

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);
        assert_eq!(exit_code, 1);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.starts_with("error: could not resolve foo-1.0.jar"));
        assert!(stderr_text.contains("connection refused"));
    }

    #[rstest]
    #[case::default(0, "error,verigen=warn")]
    #[case::verbose(1, "error,verigen=info")]
    #[case::very_verbose(2, "error,verigen=debug")]
    #[case::saturates(9, "error,verigen=trace")]
    fn log_directive_follows_verbosity(#[case] verbosity: u8, #[case] expected: &str) {
        assert_eq!(log_directive(verbosity), expected);
    }

    #[test]
    fn read_input_reports_missing_file() {
        let err = read_input(Some(Utf8Path::new("/nonexistent/build.log")))
            .expect_err("missing input");
        assert!(matches!(err, GeneratorError::ReadInput { .. }));
    }

    #[test]
    fn write_document_then_read_input_round_trips() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::try_from(dir.path().join("components.xml")).expect("UTF-8 path");
        write_document(Some(&path), "<component/>\n").expect("write document");
        assert_eq!(
            read_input(Some(&path)).expect("read back"),
            "<component/>\n"
        );
    }

    #[test]
    fn run_fails_on_invalid_config_before_reading_input() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = Utf8PathBuf::try_from(dir.path().join("verigen.toml")).expect("UTF-8 path");
        std::fs::write(&config, "jobs = 0\n").expect("write config");
        let cli = Cli::parse_from(["verigen", "-c", config.as_str(), "/nonexistent/build.log"]);

        let mut stderr = Vec::new();
        let err = run(&cli, &mut stderr).expect_err("invalid config");
        assert!(matches!(err, GeneratorError::Config { .. }));
    }
}
