//! Distance-sweep reports for UWB ranging nodes
//!
//! Ties the importer and the statistics engine together: load each node's
//! trial files, build its per-distance table and render the result.
//!
//! # Example
//!
//! ```no_run
//! use uwb_report::config::Config;
//! use uwb_report::reporter::Reporter;
//! use uwb_report::runner::AnalysisRunner;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = Config::from_file("uwb-report.toml")?;
//! let results = AnalysisRunner::new(config.clone()).run()?;
//! Reporter::new(config.report.format).report(&results)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod reporter;
pub mod runner;

pub use config::Config;
pub use reporter::{OutputFormat, Reporter};
pub use runner::{AnalysisResults, AnalysisRunner, NodeReport};
