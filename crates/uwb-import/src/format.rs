//! Serde schema of the experiment JSON files written by the ranging firmware.
//!
//! ```text
//! {
//!   "configurations": { "ID": "100", "Channel": 5, "DS-TWR": true, "Pulse rate": "Pulse Rate: 1 OK", ... },
//!   "drops":   { "<peer>": { "0": { "count": 0, "events": {...} }, ..., "3": {...} } },
//!   "samples": { "<peer>": [ { "RSSI": -80, "RANGE": 10.1, "UWB_DIAGNOSTICS": {...}, "EVENTS": {...} } ] }
//! }
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;

use uwb_stats::{DiagnosticSample, PulseRateClass, RadioConfiguration, TwrMode};

use crate::error::{ImportError, Result};

lazy_static! {
    /// First digit run of the pulse-rate description ("Pulse Rate: 1 OK")
    static ref PULSE_RATE_CLASS: Regex = Regex::new(r"\d+").unwrap();
}

/// A number the firmware sometimes writes as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(u64),
    Text(String),
}

impl NumberOrText {
    fn parse_u32(&self, field: &'static str) -> Result<u32> {
        let invalid = || ImportError::InvalidConfiguration {
            field,
            value: self.to_string(),
        };
        match self {
            NumberOrText::Number(n) => u32::try_from(*n).map_err(|_| invalid()),
            NumberOrText::Text(s) => s.trim().parse().map_err(|_| invalid()),
        }
    }
}

impl std::fmt::Display for NumberOrText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumberOrText::Number(n) => write!(f, "{}", n),
            NumberOrText::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigurations {
    #[serde(rename = "ID")]
    pub id: NumberOrText,
    #[serde(rename = "Channel")]
    pub channel: NumberOrText,
    #[serde(rename = "DS-TWR")]
    pub ds_twr: bool,
    #[serde(rename = "SFD", default)]
    pub sfd: bool,
    #[serde(rename = "External Amps", default)]
    pub external_amps: String,
    #[serde(rename = "Data rate", default)]
    pub data_rate: String,
    #[serde(rename = "Pulse rate")]
    pub pulse_rate: String,
    #[serde(rename = "PHR", default)]
    pub phr: bool,
    #[serde(rename = "Preamble", default)]
    pub preamble: String,
    #[serde(rename = "PAC", default)]
    pub pac: String,
    #[serde(rename = "TX Power", default)]
    pub tx_power: String,
}

impl RawConfigurations {
    pub fn to_configuration(&self) -> Result<RadioConfiguration> {
        Ok(RadioConfiguration {
            node_id: self.id.parse_u32("ID")?,
            channel: self.channel.parse_u32("Channel")?,
            twr_mode: TwrMode::from_double_sided(self.ds_twr),
            pulse_rate: pulse_rate_class(&self.pulse_rate),
            proprietary_sfd: self.sfd,
            proprietary_phr: self.phr,
            external_amps: self.external_amps.clone(),
            data_rate: self.data_rate.clone(),
            preamble: self.preamble.clone(),
            pac: self.pac.clone(),
            tx_power: self.tx_power.clone(),
        })
    }
}

/// Extract the pulse-rate class from its textual description.
pub fn pulse_rate_class(description: &str) -> PulseRateClass {
    match PULSE_RATE_CLASS.find(description) {
        Some(m) => PulseRateClass::from_class(m.as_str()),
        None => PulseRateClass::from_class(description),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStageDrops {
    pub count: u64,
    #[serde(default)]
    pub events: Option<BTreeMap<String, u64>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawDiagnostics {
    #[serde(rename = "MAX_GROWTH_CIR")]
    pub max_growth_cir: u32,
    #[serde(rename = "RX_PREAMBLE_CNT")]
    pub rx_preamble_cnt: u32,
    #[serde(rename = "FIRST_PATH_AMP1")]
    pub first_path_amp1: u32,
    #[serde(rename = "FIRST_PATH_AMP2")]
    pub first_path_amp2: u32,
    #[serde(rename = "FIRST_PATH_AMP3")]
    pub first_path_amp3: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSample {
    #[serde(rename = "RSSI")]
    pub rssi: i32,
    #[serde(rename = "RANGE")]
    pub range: f64,
    #[serde(rename = "UWB_DIAGNOSTICS")]
    pub diagnostics: RawDiagnostics,
    #[serde(rename = "EVENTS", default)]
    pub events: Option<BTreeMap<String, u64>>,
}

impl RawSample {
    pub fn to_sample(&self) -> DiagnosticSample {
        DiagnosticSample {
            rssi: self.rssi,
            range: self.range,
            max_growth_cir: self.diagnostics.max_growth_cir,
            rx_preamble_cnt: self.diagnostics.rx_preamble_cnt,
            first_path_amp1: self.diagnostics.first_path_amp1,
            first_path_amp2: self.diagnostics.first_path_amp2,
            first_path_amp3: self.diagnostics.first_path_amp3,
        }
    }
}

/// Top-level experiment file.
#[derive(Debug, Clone, Deserialize)]
pub struct ExperimentFile {
    pub configurations: RawConfigurations,
    /// Peer id -> stage index -> drops
    #[serde(default)]
    pub drops: BTreeMap<String, BTreeMap<String, RawStageDrops>>,
    /// Peer id -> samples in capture order
    #[serde(default)]
    pub samples: BTreeMap<String, Vec<RawSample>>,
}
