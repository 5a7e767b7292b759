//! Experiment file import for ranging trials
//!
//! Reads the JSON files recorded during distance sweeps and turns them into
//! [`uwb_stats::DistanceTrial`] values ready for the statistics engine.
//!
//! Data is laid out one directory per node, one file per distance:
//!
//! ```text
//! data/
//!   Node 100/
//!     10m.json
//!     20m.json
//!     20m_2.json   <- second trial at 20m
//! ```

pub mod error;
pub mod format;
pub mod loader;
pub mod naming;

pub use error::ImportError;
pub use format::ExperimentFile;
pub use loader::{discover_nodes, load_node, load_trial_file, LoadedTrial, PeerSelection};
pub use naming::{node_directory, parse_trial_name};
