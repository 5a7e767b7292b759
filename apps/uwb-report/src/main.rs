//! UWB Report Binary
//!
//! Builds per-distance statistics for every node in a data directory and
//! prints them to stdout. Logs go to stderr.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use uwb_report::{AnalysisRunner, Config, OutputFormat, Reporter};
use uwb_stats::EvaluationMode;

#[derive(Parser, Debug)]
#[command(name = "uwb-report")]
#[command(version, about = "Per-distance statistics for UWB ranging trials")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory containing `Node <id>` folders
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Node to process (repeatable); defaults to every node found
    #[arg(short, long = "node")]
    nodes: Vec<u32>,

    /// Only use data recorded against this peer
    #[arg(short, long)]
    peer: Option<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Skip distances that cannot be evaluated instead of failing
    #[arg(long)]
    best_effort: bool,

    /// Evaluate distances on the calling thread
    #[arg(long)]
    sequential: bool,
}

impl Args {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(data_dir) = self.data_dir {
            config.input.data_dir = data_dir;
        }
        if !self.nodes.is_empty() {
            config.input.nodes = self.nodes;
        }
        if self.peer.is_some() {
            config.input.peer = self.peer;
        }
        if let Some(format) = self.format {
            config.report.format = format;
        }
        if self.best_effort {
            config.analysis.mode = EvaluationMode::BestEffort;
        }
        if self.sequential {
            config.analysis.parallel = false;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries the report, so logs must stay on stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting uwb-report v{}", env!("CARGO_PKG_VERSION"));

    let config = args.into_config()?;
    let format = config.report.format;
    let results = AnalysisRunner::new(config).run()?;
    Reporter::new(format).report(&results)?;

    Ok(())
}
