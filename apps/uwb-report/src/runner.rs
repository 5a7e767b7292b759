//! Report execution
//!
//! Loads every selected node directory, builds its distance table and
//! collects the outcome into [`AnalysisResults`] for the reporters.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use uwb_import::{discover_nodes, load_node};
use uwb_stats::{
    CounterFloor, DerivedMetricsRow, DistanceStatsTable, EvaluationMode, RadioConfiguration,
};

use crate::config::Config;

/// Results of a complete report run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResults {
    /// When the run started (RFC 3339)
    pub generated_at: String,
    /// Data directory the nodes were read from
    pub data_dir: String,
    pub config_summary: ConfigSummary,
    /// One entry per node, ascending by node id
    pub nodes: Vec<NodeReport>,
}

impl AnalysisResults {
    /// Total number of distances skipped across all nodes.
    pub fn skipped_count(&self) -> usize {
        self.nodes.iter().map(|n| n.skipped.len()).sum()
    }
}

/// Analysis options that shaped the run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub mode: EvaluationMode,
    pub counter_floor: CounterFloor,
    pub parallel: bool,
    /// Peer restriction, `None` when every peer is pooled
    pub peer: Option<String>,
}

/// Report for a single node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeReport {
    pub node: u32,
    /// Radio settings of the node's first trial file
    pub configuration: Option<RadioConfiguration>,
    /// Number of trial files read
    pub trial_files: usize,
    /// Rows ascending by distance
    pub rows: Vec<DerivedMetricsRow>,
    pub skipped: Vec<SkippedEntry>,
}

/// A distance left out of a best-effort table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub distance: u32,
    pub trial: Option<u32>,
    pub reason: String,
}

/// Drives the load and analysis of every selected node
pub struct AnalysisRunner {
    config: Config,
}

impl AnalysisRunner {
    /// Create a new runner with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Process every selected node.
    ///
    /// Nodes come from `input.nodes`, or from the `Node <id>` directories
    /// under `input.data_dir` when that list is empty. The first node that
    /// fails aborts the run.
    #[instrument(skip(self), fields(data_dir = %self.config.input.data_dir.display()))]
    pub fn run(&self) -> Result<AnalysisResults> {
        let generated_at = chrono::Utc::now().to_rfc3339();
        let data_dir = &self.config.input.data_dir;

        let nodes = if self.config.input.nodes.is_empty() {
            discover_nodes(data_dir)
                .with_context(|| format!("Failed to list nodes in {}", data_dir.display()))?
        } else {
            self.config.input.nodes.clone()
        };

        if nodes.is_empty() {
            warn!("No node directories found");
        }
        info!("Processing {} node(s)", nodes.len());

        let reports = nodes
            .into_iter()
            .map(|node| self.analyze_node(node))
            .collect::<Result<Vec<_>>>()?;

        Ok(AnalysisResults {
            generated_at,
            data_dir: data_dir.display().to_string(),
            config_summary: ConfigSummary {
                mode: self.config.analysis.mode,
                counter_floor: self.config.analysis.counter_floor,
                parallel: self.config.analysis.parallel,
                peer: self.config.input.peer.clone(),
            },
            nodes: reports,
        })
    }

    /// Load one node's trial files and build its table.
    #[instrument(skip(self))]
    pub fn analyze_node(&self, node: u32) -> Result<NodeReport> {
        let loaded = load_node(
            &self.config.input.data_dir,
            node,
            &self.config.peer_selection(),
        )
        .with_context(|| format!("Failed to load node {}", node))?;

        let trial_files = loaded.len();
        let configuration = loaded.first().map(|t| t.trial.configuration.clone());
        info!("Loaded {} trial file(s)", trial_files);

        let table = DistanceStatsTable::from_trials(
            loaded.into_iter().map(|t| t.trial),
            &self.config.table_options(),
        )
        .with_context(|| format!("Failed to build stats table for node {}", node))?;

        let skipped: Vec<SkippedEntry> = table
            .skipped()
            .iter()
            .map(|s| SkippedEntry {
                distance: s.distance,
                trial: s.trial,
                reason: s.reason.to_string(),
            })
            .collect();

        for entry in &skipped {
            warn!(distance = entry.distance, "Skipped: {}", entry.reason);
        }

        Ok(NodeReport {
            node,
            configuration,
            trial_files,
            rows: table.rows().to_vec(),
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn sample(range: f64, cir: u32) -> String {
        format!(
            r#"{{"RSSI": -81, "RANGE": {range},
                "UWB_DIAGNOSTICS": {{"MAX_GROWTH_CIR": {cir}, "RX_PREAMBLE_CNT": 121,
                    "FIRST_PATH_AMP1": 4000, "FIRST_PATH_AMP2": 3800, "FIRST_PATH_AMP3": 3000}},
                "EVENTS": {{}}}}"#
        )
    }

    fn experiment(samples: &[String]) -> String {
        format!(
            r#"{{
                "configurations": {{
                    "ID": 7, "Channel": 5, "DS-TWR": false, "SFD": false,
                    "External Amps": "None", "Data rate": "6.8 Mbps",
                    "Pulse rate": "Pulse Rate: 2", "PHR": false,
                    "Preamble": "128", "PAC": "8", "TX Power": "TX Power: Max"
                }},
                "drops": {{ "8": {{
                    "0": {{"count": 1}}, "1": {{"count": 0}},
                    "2": {{"count": 0}}, "3": {{"count": 0}}
                }} }},
                "samples": {{ "8": [{}] }}
            }}"#,
            samples.join(",")
        )
    }

    fn node_with(data: &Path, files: &[(&str, String)]) {
        let dir = data.join("Node 7");
        fs::create_dir_all(&dir).unwrap();
        for (name, content) in files {
            fs::write(dir.join(name), content).unwrap();
        }
    }

    fn config_for(data: &Path) -> Config {
        let mut config = Config::default();
        config.input.data_dir = data.to_path_buf();
        config
    }

    #[test]
    fn test_analyze_node() {
        let data = tempfile::tempdir().unwrap();
        node_with(
            data.path(),
            &[
                ("5m.json", experiment(&[sample(5.1, 1500), sample(4.9, 1700)])),
                ("1m.json", experiment(&[sample(1.2, 2000), sample(1.0, 2100)])),
            ],
        );

        let report = AnalysisRunner::new(config_for(data.path()))
            .analyze_node(7)
            .unwrap();

        assert_eq!(report.node, 7);
        assert_eq!(report.trial_files, 2);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].distance, 1);
        assert_eq!(report.rows[1].distance, 5);
        // single sided: 2 exchanges, 1 dropped poll
        assert_eq!(report.rows[0].total_rx, 3);
        assert!(report.skipped.is_empty());
        assert_eq!(report.configuration.unwrap().node_id, 7);
    }

    #[test]
    fn test_fail_fast_names_distance() {
        let data = tempfile::tempdir().unwrap();
        node_with(
            data.path(),
            &[
                ("5m.json", experiment(&[sample(5.1, 1500), sample(4.9, 1700)])),
                ("3m.json", experiment(&[sample(3.0, 1500)])),
            ],
        );

        let err = AnalysisRunner::new(config_for(data.path()))
            .analyze_node(7)
            .unwrap_err();
        let chain = format!("{:#}", err);
        assert!(chain.contains("node 7"));
        assert!(chain.contains("3m"));
    }

    #[test]
    fn test_best_effort_skips_distance() {
        let data = tempfile::tempdir().unwrap();
        node_with(
            data.path(),
            &[
                ("5m.json", experiment(&[sample(5.1, 1500), sample(4.9, 1700)])),
                ("3m.json", experiment(&[sample(3.0, 1500)])),
            ],
        );

        let mut config = config_for(data.path());
        config.analysis.mode = EvaluationMode::BestEffort;
        let report = AnalysisRunner::new(config).analyze_node(7).unwrap();

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].distance, 3);
    }

    #[test]
    fn test_run_discovers_nodes() {
        let data = tempfile::tempdir().unwrap();
        node_with(
            data.path(),
            &[("2m.json", experiment(&[sample(2.1, 1500), sample(1.9, 1600)]))],
        );

        let results = AnalysisRunner::new(config_for(data.path())).run().unwrap();
        assert_eq!(results.nodes.len(), 1);
        assert_eq!(results.nodes[0].node, 7);
        assert_eq!(results.skipped_count(), 0);
        assert_eq!(results.config_summary.peer, None);
    }

    #[test]
    fn test_run_missing_node() {
        let data = tempfile::tempdir().unwrap();
        let mut config = config_for(data.path());
        config.input.nodes = vec![99];

        let err = AnalysisRunner::new(config).run().unwrap_err();
        assert!(format!("{:#}", err).contains("node 99"));
    }
}
