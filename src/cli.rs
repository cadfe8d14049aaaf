//! CLI argument definitions for the verification-metadata generator.
//!
//! Kept apart from the binary so argument handling can be tested without
//! spawning a process.

use std::num::NonZeroUsize;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;

use crate::config::GeneratorConfig;
use crate::pipeline::PipelineOptions;

/// Generate dependency verification metadata from a build failure log.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "verigen")]
#[command(version, about)]
#[command(long_about = concat!(
    "Generate dependency verification metadata from a build failure log.\n\n",
    "Reads the lines Gradle prints for artifacts that have no verification ",
    "metadata, looks up a SHA-256 digest for each one, and writes the ",
    "matching <component> entries for verification-metadata.xml.\n\n",
    "A digest published next to the artifact (<artifact>.sha256) is used as-is. ",
    "When none exists the artifact is downloaded and hashed locally. Each ",
    "artifact is reported on stderr as either \"pre-computed digest found\" or ",
    "\"digest computed locally\".",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Generate entries from a saved build log:\n",
    "    $ verigen build-failure.log > components.xml\n\n",
    "  Pipe a build straight in, continuing past unreachable artifacts:\n",
    "    $ ./gradlew assemble 2>&1 | verigen --keep-going -o components.xml\n\n",
    "  Use a mirror and extra repositories from a config file:\n",
    "    $ verigen -c verigen.toml build-failure.log",
))]
pub struct Cli {
    /// Failure log to read; `-` or omitted reads stdin.
    #[arg(value_name = "INPUT")]
    pub input: Option<Utf8PathBuf>,

    /// Write the document to FILE instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<Utf8PathBuf>,

    /// TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Maximum number of artifacts resolved concurrently.
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<NonZeroUsize>,

    /// Omit artifacts whose digest cannot be fetched instead of failing.
    #[arg(short, long)]
    pub keep_going: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// The input file, or `None` when stdin should be read.
    #[must_use]
    pub fn input_path(&self) -> Option<&Utf8Path> {
        self.input
            .as_deref()
            .filter(|path| path.as_str() != "-")
    }

    /// Merge command-line flags over `config`.
    ///
    /// Flags win when given; otherwise the configured value applies.
    ///
    /// # Examples
    ///
    /// ```
    /// use clap::Parser;
    /// use verigen::cli::Cli;
    /// use verigen::config::GeneratorConfig;
    ///
    /// let cli = Cli::parse_from(["verigen", "-j", "2"]);
    /// let config = GeneratorConfig::from_toml_str("jobs = 16\nkeep_going = true\n").unwrap();
    /// let options = cli.pipeline_options(&config);
    /// assert_eq!(options.jobs.get(), 2);
    /// assert!(options.keep_going);
    /// ```
    #[must_use]
    pub fn pipeline_options(&self, config: &GeneratorConfig) -> PipelineOptions {
        PipelineOptions {
            jobs: self.jobs.unwrap_or(config.jobs),
            keep_going: self.keep_going || config.keep_going,
            quiet: self.quiet,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
