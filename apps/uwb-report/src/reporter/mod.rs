//! Report rendering
//!
//! Formats [`AnalysisResults`] for a terminal, for machines, or for
//! documentation.
//!
//! # Output Formats
//!
//! - **Console**: Human-readable per-node tables
//! - **JSON**: Machine-readable, compact or pretty-printed
//! - **Markdown**: One table per node, ready to paste into a test log
//!
//! # Example
//!
//! ```no_run
//! use uwb_report::reporter::{OutputFormat, Reporter};
//! use uwb_report::runner::AnalysisResults;
//!
//! # fn example(results: AnalysisResults) -> anyhow::Result<()> {
//! Reporter::new(OutputFormat::Markdown).report(&results)?;
//! # Ok(())
//! # }
//! ```

mod console;
mod json;
mod markdown;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

use crate::runner::AnalysisResults;

pub use console::ConsoleReporter;
pub use json::JsonReporter;
pub use markdown::MarkdownReporter;

/// Output format for analysis results
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Per-node tables for a terminal
    #[default]
    Console,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Markdown tables
    Markdown,
}

/// Reporter for analysis results
pub struct Reporter {
    format: OutputFormat,
}

impl Reporter {
    /// Create a new reporter with the specified output format
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Report results to stdout
    pub fn report(&self, results: &AnalysisResults) -> Result<()> {
        let stdout = io::stdout();
        self.write_to(results, stdout.lock())
    }

    /// Write results to any writer
    pub fn write_to<W: Write>(&self, results: &AnalysisResults, mut writer: W) -> Result<()> {
        let output = self.format_results(results)?;
        writer.write_all(output.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Format results as a string
    pub fn format_results(&self, results: &AnalysisResults) -> Result<String> {
        match self.format {
            OutputFormat::Json => JsonReporter::format(results, false),
            OutputFormat::JsonPretty => JsonReporter::format(results, true),
            OutputFormat::Console => ConsoleReporter::format(results),
            OutputFormat::Markdown => MarkdownReporter::format(results),
        }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(OutputFormat::default())
    }
}
