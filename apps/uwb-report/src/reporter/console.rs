//! Console reporter for analysis results
//!
//! Provides human-readable output with one ASCII table per node.

use anyhow::Result;
use std::fmt::Write;

use crate::runner::{AnalysisResults, NodeReport};

/// Console format reporter
pub struct ConsoleReporter;

impl ConsoleReporter {
    /// Format analysis results for console output
    pub fn format(results: &AnalysisResults) -> Result<String> {
        let mut output = String::new();

        // Header
        writeln!(output)?;
        writeln!(output, "╔══════════════════════════════════════════════════════════════╗")?;
        writeln!(output, "║                   UWB DISTANCE SWEEP REPORT                  ║")?;
        writeln!(output, "╚══════════════════════════════════════════════════════════════╝")?;
        writeln!(output)?;

        writeln!(output, "Data:       {}", results.data_dir)?;
        writeln!(output, "Generated:  {}", results.generated_at)?;
        writeln!(output)?;

        let summary = &results.config_summary;
        writeln!(output, "Configuration:")?;
        writeln!(output, "  Mode:           {:?}", summary.mode)?;
        writeln!(output, "  Counter floor:  {:?}", summary.counter_floor)?;
        writeln!(output, "  Parallel:       {}", summary.parallel)?;
        writeln!(
            output,
            "  Peer:           {}",
            summary.peer.as_deref().unwrap_or("all")
        )?;
        writeln!(output)?;

        for node in &results.nodes {
            Self::format_node(&mut output, node)?;
        }

        writeln!(output, "────────────────────────────────────────────────────────────────")?;
        writeln!(
            output,
            "{} node(s), {} skipped distance(s)",
            results.nodes.len(),
            results.skipped_count()
        )?;
        writeln!(output)?;
        Ok(output)
    }

    fn format_node(output: &mut String, node: &NodeReport) -> Result<()> {
        writeln!(output, "────────────────────────────────────────────────────────────────")?;
        writeln!(output, "Node {} ({} trial file(s))", node.node, node.trial_files)?;
        writeln!(output, "────────────────────────────────────────────────────────────────")?;

        if let Some(config) = &node.configuration {
            writeln!(
                output,
                "  Channel {}, {}, pulse rate {}, {}",
                config.channel,
                config.twr_mode,
                config.pulse_rate.as_str(),
                if config.data_rate.is_empty() { "-" } else { config.data_rate.as_str() }
            )?;
        }
        writeln!(output)?;

        if node.rows.is_empty() {
            writeln!(output, "  No distances evaluated")?;
        } else {
            writeln!(
                output,
                "  {:>6} {:>9} {:>7} {:>7} {:>8} {:>8} {:>6} {:>7} {:>7} {:>11}",
                "Dist", "Range", "Err", "RSSI", "Rx", "FP", "Rx-FP", "CIR", "PRR", "Drop/Total"
            )?;
            writeln!(
                output,
                "  {:>6} {:>9} {:>7} {:>7} {:>8} {:>8} {:>6} {:>7} {:>7} {:>11}",
                "(m)", "(m)", "(m)", "(dBm)", "(dBm)", "(dBm)", "(dB)", "", "(%)", ""
            )?;

            for row in &node.rows {
                writeln!(
                    output,
                    "  {:>6} {:>9.3} {:>+7.3} {:>7.1} {:>8.2} {:>8.2} {:>6.2} {:>7.0} {:>7.2} {:>11}",
                    row.distance,
                    row.range.mean,
                    row.ranging_error(),
                    row.rssi.mean,
                    row.rx_power.mean,
                    row.first_path.mean,
                    row.rx_fp_difference(),
                    row.mean_cir,
                    row.prr,
                    format!("{}/{}", row.dropped_rx, row.total_rx)
                )?;
            }
        }

        if !node.skipped.is_empty() {
            writeln!(output)?;
            writeln!(output, "  Skipped:")?;
            for skipped in &node.skipped {
                writeln!(output, "    • {}m: {}", skipped.distance, skipped.reason)?;
            }
        }

        writeln!(output)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::tests::create_test_results;

    #[test]
    fn test_console_format() {
        let results = create_test_results();
        let output = ConsoleReporter::format(&results).unwrap();

        assert!(output.contains("UWB DISTANCE SWEEP REPORT"));
        assert!(output.contains("Node 100 (3 trial file(s))"));
        assert!(output.contains("Double sided"));
        assert!(output.contains("7/209"));
        assert!(output.contains("96.65"));
        assert!(output.contains("+0.250"));
    }

    #[test]
    fn test_console_lists_skipped() {
        let results = create_test_results();
        let output = ConsoleReporter::format(&results).unwrap();

        assert!(output.contains("Skipped:"));
        assert!(output.contains("30m: Insufficient samples"));
        assert!(output.contains("1 node(s), 1 skipped distance(s)"));
    }

    #[test]
    fn test_console_empty_node() {
        let mut results = create_test_results();
        results.nodes[0].rows.clear();
        let output = ConsoleReporter::format(&results).unwrap();
        assert!(output.contains("No distances evaluated"));
    }
}
