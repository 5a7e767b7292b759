//! Data model for ranging trials.
//!
//! These types are produced by the experiment loader and consumed read-only by
//! the statistics engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::StatsError;

/// Pulse-rate class reported by a node.
///
/// Only class `"1"` changes the power-formula constant; every other class
/// shares the default constant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PulseRateClass {
    /// Pulse-rate class "1"
    Class1,
    /// Any other reported class, kept verbatim
    Other(String),
}

impl PulseRateClass {
    /// Build a class from its textual identifier (e.g. `"1"`).
    pub fn from_class(class: &str) -> Self {
        match class.trim() {
            "1" => PulseRateClass::Class1,
            other => PulseRateClass::Other(other.to_string()),
        }
    }

    /// Textual class identifier.
    pub fn as_str(&self) -> &str {
        match self {
            PulseRateClass::Class1 => "1",
            PulseRateClass::Other(class) => class,
        }
    }

    /// Constant `A` subtracted by the power formulas, in dB.
    pub fn formula_constant(&self) -> f64 {
        match self {
            PulseRateClass::Class1 => 121.74,
            PulseRateClass::Other(_) => 113.77,
        }
    }
}

/// Two-way ranging protocol variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TwrMode {
    /// Double-sided: response and report are both received per exchange
    DoubleSided,
    /// Single-sided: one reception per exchange
    SingleSided,
}

impl TwrMode {
    pub fn from_double_sided(double_sided: bool) -> Self {
        if double_sided {
            TwrMode::DoubleSided
        } else {
            TwrMode::SingleSided
        }
    }

    pub fn is_double_sided(&self) -> bool {
        matches!(self, TwrMode::DoubleSided)
    }

    /// Radio receptions performed by one completed exchange.
    pub fn receptions_per_exchange(&self) -> u64 {
        match self {
            TwrMode::DoubleSided => 2,
            TwrMode::SingleSided => 1,
        }
    }
}

impl fmt::Display for TwrMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TwrMode::DoubleSided => write!(f, "Double sided"),
            TwrMode::SingleSided => write!(f, "Single sided"),
        }
    }
}

/// Per-node radio settings, fixed for the lifetime of a trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadioConfiguration {
    pub node_id: u32,
    pub channel: u32,
    pub twr_mode: TwrMode,
    pub pulse_rate: PulseRateClass,
    /// Proprietary start-of-frame delimiter
    #[serde(default)]
    pub proprietary_sfd: bool,
    /// Proprietary PHY header
    #[serde(default)]
    pub proprietary_phr: bool,
    #[serde(default)]
    pub external_amps: String,
    #[serde(default)]
    pub data_rate: String,
    #[serde(default)]
    pub preamble: String,
    #[serde(default)]
    pub pac: String,
    #[serde(default)]
    pub tx_power: String,
}

impl RadioConfiguration {
    /// Minimal configuration with empty textual fields.
    pub fn new(node_id: u32, channel: u32, twr_mode: TwrMode, pulse_rate: PulseRateClass) -> Self {
        Self {
            node_id,
            channel,
            twr_mode,
            pulse_rate,
            proprietary_sfd: false,
            proprietary_phr: false,
            external_amps: String::new(),
            data_rate: String::new(),
            preamble: String::new(),
            pac: String::new(),
            tx_power: String::new(),
        }
    }

    pub fn formula_constant(&self) -> f64 {
        self.pulse_rate.formula_constant()
    }
}

/// Outcome of one successful ranging exchange.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticSample {
    #[serde(rename = "RSSI")]
    pub rssi: i32,
    #[serde(rename = "RANGE")]
    pub range: f64,
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

/// Stage of a ranging exchange at which a drop was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DropStage {
    Poll,
    Response,
    Final,
    Report,
}

impl DropStage {
    pub const ALL: [DropStage; 4] = [
        DropStage::Poll,
        DropStage::Response,
        DropStage::Final,
        DropStage::Report,
    ];

    /// Index used by the diagnostic format.
    pub fn index(&self) -> u8 {
        match self {
            DropStage::Poll => 0,
            DropStage::Response => 1,
            DropStage::Final => 2,
            DropStage::Report => 3,
        }
    }
}

impl TryFrom<u8> for DropStage {
    type Error = StatsError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(DropStage::Poll),
            1 => Ok(DropStage::Response),
            2 => Ok(DropStage::Final),
            3 => Ok(DropStage::Report),
            other => Err(StatsError::InvalidInput(format!(
                "Unknown drop stage index: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for DropStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DropStage::Poll => "poll",
            DropStage::Response => "response",
            DropStage::Final => "final",
            DropStage::Report => "report",
        };
        f.write_str(name)
    }
}

/// Drops counted at one exchange stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeDropRecord {
    pub stage: DropStage,
    pub count: u64,
    /// Diagnostic event counters keyed by event name
    #[serde(default)]
    pub events: BTreeMap<String, u64>,
    pub double_sided: bool,
}

impl ExchangeDropRecord {
    pub fn new(stage: DropStage, count: u64, double_sided: bool) -> Self {
        Self {
            stage,
            count,
            events: BTreeMap::new(),
            double_sided,
        }
    }

    pub fn with_events(mut self, events: BTreeMap<String, u64>) -> Self {
        self.events = events;
        self
    }
}

/// All samples and drops captured at one distance in one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceTrial {
    /// Distance in meters
    pub distance: u32,
    /// Repetition index, `None` for single-run data
    pub trial: Option<u32>,
    pub configuration: RadioConfiguration,
    pub samples: Vec<DiagnosticSample>,
    pub drops: Vec<ExchangeDropRecord>,
}

impl DistanceTrial {
    pub fn new(
        distance: u32,
        trial: Option<u32>,
        configuration: RadioConfiguration,
        samples: Vec<DiagnosticSample>,
        drops: Vec<ExchangeDropRecord>,
    ) -> Self {
        Self {
            distance,
            trial,
            configuration,
            samples,
            drops,
        }
    }

    /// Number of completed exchanges.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn ranges(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.range).collect()
    }

    pub fn rssi(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.rssi as f64).collect()
    }

    /// Event counters summed over every drop record, per stage.
    pub fn event_totals(&self) -> BTreeMap<DropStage, BTreeMap<String, u64>> {
        let mut totals: BTreeMap<DropStage, BTreeMap<String, u64>> = BTreeMap::new();
        for record in &self.drops {
            let stage_totals = totals.entry(record.stage).or_default();
            for (event, count) in &record.events {
                *stage_totals.entry(event.clone()).or_insert(0) += count;
            }
        }
        totals
    }

    /// Merge repeated trials taken at the same distance into one pooled trial.
    ///
    /// Samples and drop records are concatenated so downstream statistics see
    /// the pooled population. All trials must share the distance, the
    /// ranging mode and the pulse-rate class, since the class selects the
    /// power-formula constant. The pooled trial keeps the first trial's
    /// configuration and carries no trial index.
    pub fn pool(trials: Vec<DistanceTrial>) -> Result<DistanceTrial, StatsError> {
        let mut iter = trials.into_iter();
        let mut pooled = iter
            .next()
            .ok_or_else(|| StatsError::InvalidInput("No trials to pool".to_string()))?;

        let mut merged = 1usize;
        for trial in iter {
            if trial.distance != pooled.distance {
                return Err(StatsError::InvalidInput(format!(
                    "Cannot pool trials at {}m and {}m",
                    pooled.distance, trial.distance
                )));
            }
            if trial.configuration.twr_mode != pooled.configuration.twr_mode {
                return Err(StatsError::InvalidInput(format!(
                    "Cannot pool {} and {} trials at {}m",
                    pooled.configuration.twr_mode, trial.configuration.twr_mode, trial.distance
                )));
            }
            if trial.configuration.pulse_rate != pooled.configuration.pulse_rate {
                return Err(StatsError::InvalidInput(format!(
                    "Cannot pool pulse rate classes {} and {} at {}m",
                    pooled.configuration.pulse_rate.as_str(),
                    trial.configuration.pulse_rate.as_str(),
                    trial.distance
                )));
            }
            pooled.samples.extend(trial.samples);
            pooled.drops.extend(trial.drops);
            merged += 1;
        }

        if merged > 1 {
            pooled.trial = None;
        }
        Ok(pooled)
    }
}
