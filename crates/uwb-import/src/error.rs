use std::path::PathBuf;
use thiserror::Error;
use uwb_stats::StatsError;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse experiment file {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Improperly named file: {0}")]
    InvalidFileName(String),

    #[error("Invalid configuration field {field}: {value}")]
    InvalidConfiguration { field: &'static str, value: String },

    #[error("Peer {peer} not present in experiment file")]
    UnknownPeer { peer: String },

    #[error("Peer {peer} has samples but no drop records")]
    MissingDrops { peer: String },

    #[error("Invalid drop stage for peer {peer}: {source}")]
    InvalidStage {
        peer: String,
        #[source]
        source: StatsError,
    },

    #[error("Sample {index} from peer {peer} has a zero RX_PREAMBLE_CNT")]
    ZeroPreambleCount { peer: String, index: usize },

    #[error("Node directory not found: {}", .0.display())]
    MissingNodeDirectory(PathBuf),
}

pub type Result<T> = std::result::Result<T, ImportError>;
