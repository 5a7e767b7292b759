//! JSON reporter for analysis results

use crate::runner::AnalysisResults;
use anyhow::Result;

/// JSON format reporter
pub struct JsonReporter;

impl JsonReporter {
    /// Format analysis results as JSON
    ///
    /// # Arguments
    ///
    /// * `results` - The analysis results to format
    /// * `pretty` - Whether to pretty-print the JSON
    pub fn format(results: &AnalysisResults, pretty: bool) -> Result<String> {
        let mut output = if pretty {
            serde_json::to_string_pretty(results)?
        } else {
            serde_json::to_string(results)?
        };
        output.push('\n');
        Ok(output)
    }
}
