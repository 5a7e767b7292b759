//! Radio performance statistics for UWB ranging trials
//!
//! This crate derives signal-power estimates, descriptive statistics and
//! packet-reception rates from per-exchange diagnostic records captured at
//! known distances.
//!
//! # Features
//!
//! - **Power Estimation**: received and first-path signal power from raw CIR counters
//! - **Reception Accounting**: multi-stage drop counts to packet reception rate
//! - **Descriptive Statistics**: mean, median, sample stddev and variance per column
//! - **Distance Table**: one row of derived metrics per distance, in ascending order
//!
//! Inputs are already-parsed, immutable [`DistanceTrial`] values; nothing in
//! this crate touches the filesystem.

pub mod error;
pub mod power;
pub mod reception;
pub mod stats;
pub mod table;
pub mod types;

pub use error::StatsError;
pub use power::CounterFloor;
pub use reception::{ReceptionAccountant, ReceptionSummary, StageDrops};
pub use stats::Summary;
pub use table::{
    derive_row, DerivedMetricsRow, DistanceStatsTable, EvaluationMode, SkippedDistance,
    TableOptions,
};
pub use types::{
    DiagnosticSample, DistanceTrial, DropStage, ExchangeDropRecord, PulseRateClass,
    RadioConfiguration, TwrMode,
};
