//! Configuration parsing for report runs
//!
//! Runs are configured from a TOML file; every field has a default so an
//! empty file (or no file at all) is a valid configuration.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use uwb_import::PeerSelection;
use uwb_stats::{CounterFloor, EvaluationMode, TableOptions};

use crate::reporter::OutputFormat;

/// Main configuration structure loaded from TOML files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where the trial data lives
    #[serde(default)]
    pub input: InputConfig,
    /// Statistics options
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Output options
    #[serde(default)]
    pub report: ReportConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML is malformed
    ///
    /// # Example
    ///
    /// ```no_run
    /// use uwb_report::config::Config;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = Config::from_file("uwb-report.toml")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    ///
    /// # Example
    ///
    /// ```
    /// use uwb_report::config::Config;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let toml = r#"
    ///     [input]
    ///     data_dir = "sweeps"
    ///     nodes = [100]
    /// "#;
    /// let config = Config::from_str(toml)?;
    /// assert_eq!(config.input.nodes, vec![100]);
    /// # Ok(())
    /// # }
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }

    /// Table options derived from the analysis section.
    pub fn table_options(&self) -> TableOptions {
        TableOptions {
            mode: self.analysis.mode,
            counter_floor: self.analysis.counter_floor,
            parallel: self.analysis.parallel,
        }
    }

    /// Peer selection derived from the input section.
    pub fn peer_selection(&self) -> PeerSelection {
        match &self.input.peer {
            Some(peer) => PeerSelection::Only(peer.clone()),
            None => PeerSelection::All,
        }
    }
}

/// Input location and node selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Directory containing `Node <id>` folders (default: "data")
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Nodes to process; empty means every node found in `data_dir`
    #[serde(default)]
    pub nodes: Vec<u32>,
    /// Restrict each file to a single peer
    #[serde(default)]
    pub peer: Option<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            nodes: Vec::new(),
            peer: None,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Statistics options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Fail-fast or best-effort table construction
    #[serde(default)]
    pub mode: EvaluationMode,
    /// Handling of zero CIR / first-path counters
    #[serde(default)]
    pub counter_floor: CounterFloor,
    /// Evaluate distances in parallel (default: true)
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            mode: EvaluationMode::default(),
            counter_floor: CounterFloor::default(),
            parallel: default_parallel(),
        }
    }
}

fn default_parallel() -> bool {
    true
}

/// Output options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub format: OutputFormat,
}
