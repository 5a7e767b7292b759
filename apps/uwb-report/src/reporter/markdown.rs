//! Markdown reporter for analysis results

use anyhow::Result;
use std::fmt::Write;

use crate::runner::{AnalysisResults, NodeReport};

/// Markdown format reporter
pub struct MarkdownReporter;

impl MarkdownReporter {
    /// Format analysis results as Markdown
    pub fn format(results: &AnalysisResults) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "# UWB Distance Sweep Report")?;
        writeln!(output)?;
        writeln!(output, "- **Data:** `{}`", results.data_dir)?;
        writeln!(output, "- **Generated:** {}", results.generated_at)?;
        writeln!(output, "- **Mode:** {:?}", results.config_summary.mode)?;
        writeln!(
            output,
            "- **Peer:** {}",
            results.config_summary.peer.as_deref().unwrap_or("all")
        )?;
        writeln!(output)?;

        for node in &results.nodes {
            Self::format_node(&mut output, node)?;
        }

        Ok(output)
    }

    fn format_node(output: &mut String, node: &NodeReport) -> Result<()> {
        writeln!(output, "## Node {}", node.node)?;
        writeln!(output)?;

        if let Some(config) = &node.configuration {
            writeln!(output, "| Setting | Value |")?;
            writeln!(output, "|---------|-------|")?;
            writeln!(output, "| Channel | {} |", config.channel)?;
            writeln!(output, "| TWR | {} |", config.twr_mode)?;
            writeln!(output, "| Pulse rate | {} |", config.pulse_rate.as_str())?;
            writeln!(output, "| Data rate | {} |", config.data_rate)?;
            writeln!(output, "| Preamble | {} |", config.preamble)?;
            writeln!(output, "| PAC | {} |", config.pac)?;
            writeln!(output, "| TX power | {} |", config.tx_power)?;
            writeln!(output)?;
        }

        if node.rows.is_empty() {
            writeln!(output, "_No distances evaluated._")?;
            writeln!(output)?;
        } else {
            writeln!(
                output,
                "| Distance (m) | Range (m) | Error (m) | RSSI (dBm) | Rx (dBm) | FP (dBm) | Rx-FP (dB) | CIR | PRR (%) | Dropped/Total |"
            )?;
            writeln!(
                output,
                "|-------------:|----------:|----------:|-----------:|---------:|---------:|-----------:|----:|--------:|--------------:|"
            )?;
            for row in &node.rows {
                writeln!(
                    output,
                    "| {} | {:.3} ± {:.3} | {:+.3} | {:.1} | {:.2} | {:.2} | {:.2} | {:.0} | {:.2} | {}/{} |",
                    row.distance,
                    row.range.mean,
                    row.range.std_dev,
                    row.ranging_error(),
                    row.rssi.mean,
                    row.rx_power.mean,
                    row.first_path.mean,
                    row.rx_fp_difference(),
                    row.mean_cir,
                    row.prr,
                    row.dropped_rx,
                    row.total_rx
                )?;
            }
            writeln!(output)?;
        }

        if !node.skipped.is_empty() {
            writeln!(output, "**Skipped distances:**")?;
            writeln!(output)?;
            for skipped in &node.skipped {
                writeln!(output, "- {}m: {}", skipped.distance, skipped.reason)?;
            }
            writeln!(output)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::tests::create_test_results;

    #[test]
    fn test_markdown_format() {
        let results = create_test_results();
        let output = MarkdownReporter::format(&results).unwrap();

        assert!(output.starts_with("# UWB Distance Sweep Report"));
        assert!(output.contains("## Node 100"));
        assert!(output.contains("| Data rate | 6.8 Mbps |"));
        assert!(output.contains("| 10 | 10.250 ± 0.100 | +0.250 |"));
        assert!(output.contains("| 96.65 | 7/209 |"));
    }

    #[test]
    fn test_markdown_skipped() {
        let results = create_test_results();
        let output = MarkdownReporter::format(&results).unwrap();
        assert!(output.contains("**Skipped distances:**"));
        assert!(output.contains("- 30m: Insufficient samples"));
    }
}
