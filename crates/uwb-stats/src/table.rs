//! Distance-keyed table of derived ranging metrics
//!
//! The table evaluates every distance as an isolated task (power estimation,
//! reception accounting, descriptive statistics) and assembles the resulting
//! rows in ascending distance order once every task has finished.
//!
//! ```text
//! {distance -> DistanceTrial}
//!        │   (one task per distance, optionally on the rayon pool)
//!        ▼
//!  power ─┬─ reception ─┬─ descriptive stats
//!         ▼              ▼
//!   row-or-error per distance ──► sorted by distance ──► DistanceStatsTable
//! ```
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use uwb_stats::{
//!     DiagnosticSample, DistanceStatsTable, DistanceTrial, PulseRateClass,
//!     RadioConfiguration, TwrMode,
//! };
//!
//! let config = RadioConfiguration::new(100, 5, TwrMode::DoubleSided, PulseRateClass::from_class("1"));
//! let sample = |range| DiagnosticSample {
//!     rssi: -70,
//!     range,
//!     max_growth_cir: 1500,
//!     rx_preamble_cnt: 120,
//!     first_path_amp1: 4000,
//!     first_path_amp2: 3500,
//!     first_path_amp3: 3000,
//! };
//!
//! let mut trials = BTreeMap::new();
//! trials.insert(5, DistanceTrial::new(5, None, config, vec![sample(4.9), sample(5.2)], vec![]));
//!
//! let table = DistanceStatsTable::new(trials).unwrap();
//! let row = table.row(5).unwrap();
//! assert_eq!(row.total_rx, 4);
//! assert_eq!(row.prr, 100.0);
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

use crate::error::StatsError;
use crate::power::{sample_first_path_power, sample_received_power, CounterFloor};
use crate::reception::ReceptionAccountant;
use crate::stats::{mean, Summary};
use crate::types::DistanceTrial;

/// What to do when a single distance cannot be evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Abort table construction on the first failing distance
    #[default]
    FailFast,
    /// Skip failing distances and record why
    BestEffort,
}

/// Options controlling table construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableOptions {
    pub mode: EvaluationMode,
    pub counter_floor: CounterFloor,
    /// Evaluate distances on the rayon thread pool
    pub parallel: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            mode: EvaluationMode::FailFast,
            counter_floor: CounterFloor::default(),
            parallel: true,
        }
    }
}

/// Derived metrics for one distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetricsRow {
    /// Distance in meters
    pub distance: u32,
    pub range: Summary,
    pub rssi: Summary,
    /// Received power statistics (dBm)
    pub rx_power: Summary,
    /// Received power per sample (dBm)
    pub rx_power_samples: Vec<f64>,
    /// First-path power statistics (dBm)
    pub first_path: Summary,
    /// First-path power per sample (dBm)
    pub first_path_samples: Vec<f64>,
    /// Mean of the raw `MAX_GROWTH_CIR` counter
    pub mean_cir: f64,
    /// Packet reception rate in percent
    pub prr: f64,
    pub dropped_rx: u64,
    pub total_rx: u64,
}

impl DerivedMetricsRow {
    /// Mean measured range minus the true distance, in meters.
    pub fn ranging_error(&self) -> f64 {
        self.range.mean - self.distance as f64
    }

    /// Mean received power minus mean first-path power, in dB.
    pub fn rx_fp_difference(&self) -> f64 {
        self.rx_power.mean - self.first_path.mean
    }
}

/// A distance left out of a best-effort table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedDistance {
    pub distance: u32,
    pub trial: Option<u32>,
    #[serde(serialize_with = "serialize_reason")]
    pub reason: StatsError,
}

fn serialize_reason<S>(reason: &StatsError, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(reason)
}

/// Derive the metrics row for a single trial.
///
/// This is the isolated unit of work the table runs per distance.
#[instrument(skip(trial, floor), fields(distance = trial.distance, trial_index = ?trial.trial))]
pub fn derive_row(trial: &DistanceTrial, floor: CounterFloor) -> Result<DerivedMetricsRow, StatsError> {
    if trial.samples.is_empty() {
        return Err(StatsError::InvalidInput(format!(
            "No diagnostic samples at {}m",
            trial.distance
        )));
    }

    let constant = trial.configuration.formula_constant();

    let range = Summary::from_samples(&trial.ranges())?;
    let rssi = Summary::from_samples(&trial.rssi())?;

    let rx_power_samples = sample_received_power(&trial.samples, constant, floor)?;
    let rx_power = Summary::from_samples(&rx_power_samples)?;
    let cir: Vec<f64> = trial
        .samples
        .iter()
        .map(|s| s.max_growth_cir as f64)
        .collect();
    let mean_cir = mean(&cir)?;

    let first_path_samples = sample_first_path_power(&trial.samples, constant, floor)?;
    let first_path = Summary::from_samples(&first_path_samples)?;

    let reception = ReceptionAccountant::new(trial.configuration.twr_mode)
        .account(&trial.drops, trial.sample_count())?;

    debug!(
        samples = trial.sample_count(),
        prr = reception.prr,
        "Derived metrics row"
    );

    Ok(DerivedMetricsRow {
        distance: trial.distance,
        range,
        rssi,
        rx_power,
        rx_power_samples,
        first_path,
        first_path_samples,
        mean_cir,
        prr: reception.prr,
        dropped_rx: reception.dropped,
        total_rx: reception.total,
    })
}

/// Read-only table of derived metrics, one row per distance.
#[derive(Debug, Clone)]
pub struct DistanceStatsTable {
    trials: BTreeMap<u32, DistanceTrial>,
    rows: Vec<DerivedMetricsRow>,
    skipped: Vec<SkippedDistance>,
}

impl DistanceStatsTable {
    /// Build a fail-fast table with default options.
    pub fn new(trials: BTreeMap<u32, DistanceTrial>) -> Result<Self, StatsError> {
        Self::with_options(trials, &TableOptions::default())
    }

    /// Build a table from trials that may repeat distances.
    ///
    /// Trials sharing a distance are pooled before evaluation so statistics
    /// reflect the combined sample population.
    pub fn from_trials<I>(trials: I, options: &TableOptions) -> Result<Self, StatsError>
    where
        I: IntoIterator<Item = DistanceTrial>,
    {
        let mut grouped: BTreeMap<u32, Vec<DistanceTrial>> = BTreeMap::new();
        for trial in trials {
            grouped.entry(trial.distance).or_default().push(trial);
        }

        let mut pooled = BTreeMap::new();
        for (distance, group) in grouped {
            if group.len() > 1 {
                debug!(distance, trials = group.len(), "Pooling repeated trials");
            }
            let trial = DistanceTrial::pool(group)
                .map_err(|e| StatsError::at_distance(distance, None, e))?;
            pooled.insert(distance, trial);
        }

        Self::with_options(pooled, options)
    }

    /// Build a table from a distance-keyed trial map.
    ///
    /// # Errors
    ///
    /// In fail-fast mode, the failure of the lowest failing distance is
    /// returned wrapped in `StatsError::AtDistance`. Malformed keys (zero, or
    /// not matching the trial's own distance) fail in both modes.
    ///
    /// A distance without samples fails with `InvalidInput` before reception
    /// accounting runs, and any trial with samples has at least one
    /// reception, so the table never reports `DivisionByZero`. That error
    /// only comes from calling [`ReceptionAccountant::account`] directly.
    #[instrument(skip(trials, options), fields(distances = trials.len(), mode = ?options.mode))]
    pub fn with_options(
        trials: BTreeMap<u32, DistanceTrial>,
        options: &TableOptions,
    ) -> Result<Self, StatsError> {
        for (&distance, trial) in &trials {
            if distance == 0 {
                return Err(StatsError::at_distance(
                    distance,
                    trial.trial,
                    StatsError::InvalidInput("Distance must be positive".to_string()),
                ));
            }
            if trial.distance != distance {
                return Err(StatsError::at_distance(
                    distance,
                    trial.trial,
                    StatsError::InvalidInput(format!(
                        "Trial recorded at {}m stored under key {}m",
                        trial.distance, distance
                    )),
                ));
            }
        }

        let floor = options.counter_floor;
        let evaluate = |(&distance, trial): (&u32, &DistanceTrial)| {
            (distance, trial.trial, derive_row(trial, floor))
        };

        let mut outcomes: Vec<_> = if options.parallel {
            trials.par_iter().map(evaluate).collect()
        } else {
            trials.iter().map(evaluate).collect()
        };
        outcomes.sort_by_key(|(distance, _, _)| *distance);

        let mut rows = Vec::with_capacity(outcomes.len());
        let mut skipped = Vec::new();
        for (distance, trial, outcome) in outcomes {
            match (outcome, options.mode) {
                (Ok(row), _) => rows.push(row),
                (Err(reason), EvaluationMode::FailFast) => {
                    warn!(distance, error = %reason, "Stats table construction aborted");
                    return Err(StatsError::at_distance(distance, trial, reason));
                }
                (Err(reason), EvaluationMode::BestEffort) => {
                    warn!(distance, error = %reason, "Skipping distance");
                    skipped.push(SkippedDistance {
                        distance,
                        trial,
                        reason,
                    });
                }
            }
        }

        info!(
            rows = rows.len(),
            skipped = skipped.len(),
            "Stats table constructed"
        );

        Ok(Self {
            trials,
            rows,
            skipped,
        })
    }

    /// Row for an exact distance.
    pub fn row(&self, distance: u32) -> Option<&DerivedMetricsRow> {
        self.rows
            .binary_search_by_key(&distance, |row| row.distance)
            .ok()
            .map(|index| &self.rows[index])
    }

    /// Rows in ascending distance order.
    pub fn rows(&self) -> &[DerivedMetricsRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DerivedMetricsRow> {
        self.rows.iter()
    }

    /// Distinct input distance keys, ascending, including skipped ones.
    pub fn distances(&self) -> Vec<u32> {
        self.trials.keys().copied().collect()
    }

    /// Distances that produced a row, ascending. Differs from
    /// [`distances`](Self::distances) only in best-effort mode.
    pub fn row_distances(&self) -> Vec<u32> {
        self.rows.iter().map(|row| row.distance).collect()
    }

    /// The trials the table was built from.
    pub fn trials(&self) -> &BTreeMap<u32, DistanceTrial> {
        &self.trials
    }

    /// Distances left out in best-effort mode.
    pub fn skipped(&self) -> &[SkippedDistance] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<'a> IntoIterator for &'a DistanceStatsTable {
    type Item = &'a DerivedMetricsRow;
    type IntoIter = std::slice::Iter<'a, DerivedMetricsRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
