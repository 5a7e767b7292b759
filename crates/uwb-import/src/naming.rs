//! Distance, trial and node identifiers encoded in file and directory names.
//!
//! Trial files are named after the distance they were captured at, with an
//! optional repetition index: `10m.json`, `10m_2.json`. Node directories are
//! named `Node <id>`.

use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};

use crate::error::{ImportError, Result};

lazy_static! {
    static ref NUMBER: Regex = Regex::new(r"\d+").unwrap();

    /// `Node 100`
    static ref NODE_DIRECTORY: Regex = Regex::new(r"^Node\s+(\d+)$").unwrap();
}

/// Distance (meters) and optional trial index parsed from a file name.
pub fn parse_trial_name(name: &str) -> Result<(u32, Option<u32>)> {
    let invalid = || ImportError::InvalidFileName(name.to_string());
    let mut numbers = NUMBER.find_iter(name).map(|m| m.as_str().parse::<u32>());

    let distance = match numbers.next() {
        Some(Ok(distance)) => distance,
        _ => return Err(invalid()),
    };
    let trial = match numbers.next() {
        Some(Ok(trial)) => Some(trial),
        Some(Err(_)) => return Err(invalid()),
        None => None,
    };
    Ok((distance, trial))
}

/// Node id of a `Node <id>` directory name, if it is one.
pub fn parse_node_directory(name: &str) -> Option<u32> {
    NODE_DIRECTORY
        .captures(name.trim())
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Directory holding the trial files of one node.
pub fn node_directory(data_dir: &Path, node: u32) -> PathBuf {
    data_dir.join(format!("Node {}", node))
}
