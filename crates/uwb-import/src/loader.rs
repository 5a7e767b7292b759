//! Loading experiment files into [`DistanceTrial`]s.
//!
//! One experiment file holds the samples a node collected from each of its
//! peers. Peers are either pooled into a single trial or one peer is selected.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use uwb_stats::{DiagnosticSample, DistanceTrial, DropStage, ExchangeDropRecord};

use crate::error::{ImportError, Result};
use crate::format::ExperimentFile;
use crate::naming::{node_directory, parse_node_directory, parse_trial_name};

/// Which peers of an experiment file contribute to the trial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerSelection {
    /// Pool every peer
    #[default]
    All,
    /// Only the given peer id
    Only(String),
}

/// A trial together with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedTrial {
    pub trial: DistanceTrial,
    pub source: PathBuf,
    /// Peers whose data made it into the trial
    pub peers: Vec<String>,
    /// Per-sample event counters summed over the trial
    pub sample_events: BTreeMap<String, u64>,
}

impl ExperimentFile {
    /// Read and parse an experiment file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ImportError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Every peer id that appears in the samples or the drops.
    pub fn peers(&self) -> Vec<String> {
        let mut peers: Vec<String> = self
            .samples
            .keys()
            .chain(self.drops.keys())
            .cloned()
            .collect();
        peers.sort();
        peers.dedup();
        peers
    }

    /// Convert the file into a trial at the given distance.
    pub fn into_trial(
        self,
        distance: u32,
        trial: Option<u32>,
        selection: &PeerSelection,
    ) -> Result<LoadedTrial> {
        let configuration = self.configurations.to_configuration()?;
        let double_sided = configuration.twr_mode.is_double_sided();

        let peers = match selection {
            PeerSelection::All => self.peers(),
            PeerSelection::Only(peer) => {
                if !self.samples.contains_key(peer) && !self.drops.contains_key(peer) {
                    return Err(ImportError::UnknownPeer { peer: peer.clone() });
                }
                vec![peer.clone()]
            }
        };

        let mut samples: Vec<DiagnosticSample> = Vec::new();
        let mut drops: Vec<ExchangeDropRecord> = Vec::new();
        let mut sample_events: BTreeMap<String, u64> = BTreeMap::new();

        for peer in &peers {
            let peer_samples = self.samples.get(peer).map(Vec::as_slice).unwrap_or(&[]);
            let peer_drops = self.drops.get(peer);

            if !peer_samples.is_empty() && peer_drops.is_none() {
                return Err(ImportError::MissingDrops { peer: peer.clone() });
            }

            for (index, raw) in peer_samples.iter().enumerate() {
                if raw.diagnostics.rx_preamble_cnt == 0 {
                    return Err(ImportError::ZeroPreambleCount {
                        peer: peer.clone(),
                        index,
                    });
                }
                samples.push(raw.to_sample());
                for (event, count) in raw.events.iter().flatten() {
                    *sample_events.entry(event.clone()).or_insert(0) += count;
                }
            }

            for (stage_key, raw) in peer_drops.into_iter().flatten() {
                let stage = stage_key
                    .trim()
                    .parse::<u8>()
                    .map_err(|_| {
                        uwb_stats::StatsError::InvalidInput(format!(
                            "Unknown drop stage index: {}",
                            stage_key
                        ))
                    })
                    .and_then(DropStage::try_from)
                    .map_err(|source| ImportError::InvalidStage {
                        peer: peer.clone(),
                        source,
                    })?;
                drops.push(
                    ExchangeDropRecord::new(stage, raw.count, double_sided)
                        .with_events(raw.events.clone().unwrap_or_default()),
                );
            }

            debug!(peer = %peer, samples = peer_samples.len(), "Loaded peer data");
        }

        Ok(LoadedTrial {
            trial: DistanceTrial::new(distance, trial, configuration, samples, drops),
            source: PathBuf::new(),
            peers,
            sample_events,
        })
    }
}

/// Load one trial file, taking distance and trial index from its name.
#[instrument(skip(path, selection), fields(file = %path.as_ref().display()))]
pub fn load_trial_file<P: AsRef<Path>>(path: P, selection: &PeerSelection) -> Result<LoadedTrial> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (distance, trial) = parse_trial_name(&name)?;

    let mut loaded = ExperimentFile::from_path(path)?.into_trial(distance, trial, selection)?;
    loaded.source = path.to_path_buf();
    debug!(
        distance,
        trial = ?trial,
        samples = loaded.trial.sample_count(),
        "Loaded trial file"
    );
    Ok(loaded)
}

/// Node ids of every `Node <id>` directory under `data_dir`, ascending.
pub fn discover_nodes<P: AsRef<Path>>(data_dir: P) -> Result<Vec<u32>> {
    let data_dir = data_dir.as_ref();
    let entries = fs::read_dir(data_dir).map_err(|source| ImportError::Io {
        path: data_dir.to_path_buf(),
        source,
    })?;

    let mut nodes = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ImportError::Io {
            path: data_dir.to_path_buf(),
            source,
        })?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        match parse_node_directory(&name) {
            Some(node) => nodes.push(node),
            None => debug!(directory = %name, "Ignoring non-node directory"),
        }
    }
    nodes.sort_unstable();
    nodes.dedup();
    Ok(nodes)
}

/// Load every trial file of one node, ordered by distance then trial index.
#[instrument(skip(data_dir, selection))]
pub fn load_node<P: AsRef<Path>>(
    data_dir: P,
    node: u32,
    selection: &PeerSelection,
) -> Result<Vec<LoadedTrial>> {
    let dir = node_directory(data_dir.as_ref(), node);
    if !dir.is_dir() {
        return Err(ImportError::MissingNodeDirectory(dir));
    }

    let entries = fs::read_dir(&dir).map_err(|source| ImportError::Io {
        path: dir.clone(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ImportError::Io {
            path: dir.clone(),
            source,
        })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            files.push(path);
        }
    }

    if files.is_empty() {
        warn!(node, directory = %dir.display(), "No trial files found");
    }

    let mut trials = files
        .iter()
        .map(|path| load_trial_file(path, selection))
        .collect::<Result<Vec<_>>>()?;
    trials.sort_by_key(|t| (t.trial.distance, t.trial.trial));

    info!(node, files = trials.len(), "Loaded node trials");
    Ok(trials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use uwb_stats::TwrMode;

    const EXPERIMENT: &str = r#"{
        "configurations": {
            "ID": "100", "Channel": "5", "DS-TWR": true, "SFD": false,
            "External Amps": "None", "Data rate": "6.8 Mbps",
            "Pulse rate": "Pulse Rate: 2 OK", "PHR": false,
            "Preamble": "128", "PAC": "8", "TX Power": "TX Power: Max"
        },
        "drops": {
            "101": {
                "0": {"count": 1, "events": {"RX_TIMEOUT": 1}},
                "1": {"count": 2, "events": {"RX_TIMEOUT": 2}},
                "2": {"count": 0, "events": null},
                "3": {"count": 1, "events": {}}
            },
            "102": {
                "0": {"count": 0, "events": {}},
                "1": {"count": 1, "events": {}},
                "2": {"count": 0, "events": {}},
                "3": {"count": 0, "events": {}}
            }
        },
        "samples": {
            "101": [
                {"RSSI": -80, "RANGE": 9.9,
                 "UWB_DIAGNOSTICS": {"MAX_GROWTH_CIR": 1500, "RX_PREAMBLE_CNT": 121,
                    "FIRST_PATH_AMP1": 4000, "FIRST_PATH_AMP2": 3800, "FIRST_PATH_AMP3": 3000},
                 "EVENTS": {"PHE": 1}},
                {"RSSI": -81, "RANGE": 10.2,
                 "UWB_DIAGNOSTICS": {"MAX_GROWTH_CIR": 1480, "RX_PREAMBLE_CNT": 120,
                    "FIRST_PATH_AMP1": 4100, "FIRST_PATH_AMP2": 3700, "FIRST_PATH_AMP3": 2900},
                 "EVENTS": {"PHE": 2}}
            ],
            "102": [
                {"RSSI": -79, "RANGE": 10.0,
                 "UWB_DIAGNOSTICS": {"MAX_GROWTH_CIR": 1510, "RX_PREAMBLE_CNT": 122,
                    "FIRST_PATH_AMP1": 4050, "FIRST_PATH_AMP2": 3750, "FIRST_PATH_AMP3": 2950}}
            ]
        }
    }"#;

    fn experiment() -> ExperimentFile {
        serde_json::from_str(EXPERIMENT).unwrap()
    }

    #[test]
    fn test_peers_are_sorted_and_unique() {
        assert_eq!(experiment().peers(), vec!["101".to_string(), "102".to_string()]);
    }

    #[test]
    fn test_all_peers_are_pooled() {
        let loaded = experiment()
            .into_trial(10, None, &PeerSelection::All)
            .unwrap();

        assert_eq!(loaded.trial.distance, 10);
        assert_eq!(loaded.trial.sample_count(), 3);
        assert_eq!(loaded.trial.drops.len(), 8);
        assert_eq!(loaded.trial.configuration.twr_mode, TwrMode::DoubleSided);
        assert!(loaded.trial.drops.iter().all(|d| d.double_sided));
        assert_eq!(loaded.sample_events["PHE"], 3);
    }

    #[test]
    fn test_single_peer_selection() {
        let loaded = experiment()
            .into_trial(10, Some(2), &PeerSelection::Only("102".to_string()))
            .unwrap();

        assert_eq!(loaded.peers, vec!["102".to_string()]);
        assert_eq!(loaded.trial.sample_count(), 1);
        assert_eq!(loaded.trial.trial, Some(2));
        assert!(loaded.sample_events.is_empty());
    }

    #[test]
    fn test_unknown_peer() {
        let result = experiment().into_trial(10, None, &PeerSelection::Only("999".to_string()));
        assert!(matches!(result, Err(ImportError::UnknownPeer { .. })));
    }

    #[test]
    fn test_drop_events_are_kept() {
        let loaded = experiment()
            .into_trial(10, None, &PeerSelection::Only("101".to_string()))
            .unwrap();
        let totals = loaded.trial.event_totals();
        assert_eq!(totals[&DropStage::Response]["RX_TIMEOUT"], 2);
    }

    #[test]
    fn test_zero_preamble_count_is_rejected() {
        let json = EXPERIMENT.replace("\"RX_PREAMBLE_CNT\": 122", "\"RX_PREAMBLE_CNT\": 0");
        let file: ExperimentFile = serde_json::from_str(&json).unwrap();
        let result = file.into_trial(10, None, &PeerSelection::All);
        assert!(matches!(
            result,
            Err(ImportError::ZeroPreambleCount { index: 0, .. })
        ));
    }

    #[test]
    fn test_unknown_stage_is_rejected() {
        let json = EXPERIMENT.replace("\"3\": {\"count\": 1", "\"7\": {\"count\": 1");
        let file: ExperimentFile = serde_json::from_str(&json).unwrap();
        let result = file.into_trial(10, None, &PeerSelection::All);
        assert!(matches!(result, Err(ImportError::InvalidStage { .. })));
    }

    #[test]
    fn test_samples_without_drops_are_rejected() {
        let mut file = experiment();
        file.drops.remove("102");
        let result = file.into_trial(10, None, &PeerSelection::All);
        assert!(matches!(result, Err(ImportError::MissingDrops { .. })));
    }
}
