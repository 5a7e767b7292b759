//! Signal power estimation from raw UWB diagnostic counters.
//!
//! Both estimates follow the receiver's closed-form power formulas:
//!
//! ```text
//! rx_power = 10 * log10((C * 2^17) / N^2) - A
//! fp_power = 10 * log10((F1^2 + F2^2 + F3^2) / N^2) - A
//! ```
//!
//! where `C` is `MAX_GROWTH_CIR`, `N` is `RX_PREAMBLE_CNT`, `F1..F3` are the
//! first-path amplitudes and `A` is the pulse-rate dependent constant.
//!
//! # Examples
//!
//! ```
//! use uwb_stats::power::{received_power, CounterFloor};
//!
//! let dbm = received_power(1000.0, 1024.0, 113.77, CounterFloor::default()).unwrap();
//! assert!(dbm < 0.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::StatsError;
use crate::types::DiagnosticSample;

const CIR_SCALE: f64 = 131_072.0; // 2^17

/// Epsilon substituted for non-positive counters by the default policy.
pub const DEFAULT_COUNTER_EPSILON: f64 = 1e-9;

/// How a non-positive logarithm operand is handled.
///
/// A zero `MAX_GROWTH_CIR` (or zero first-path energy) would otherwise take
/// the logarithm of zero. The default substitutes a small epsilon so the
/// estimate becomes a very negative, finite sentinel value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum CounterFloor {
    /// Replace non-positive operands with `epsilon`
    Substitute { epsilon: f64 },
    /// Fail with `NonPositiveCounter`
    Reject,
}

impl Default for CounterFloor {
    fn default() -> Self {
        CounterFloor::Substitute {
            epsilon: DEFAULT_COUNTER_EPSILON,
        }
    }
}

impl CounterFloor {
    /// Apply the policy to a counter value before it reaches a logarithm.
    pub fn apply(&self, counter: &'static str, value: f64) -> Result<f64, StatsError> {
        if value > 0.0 {
            return Ok(value);
        }
        match self {
            CounterFloor::Substitute { epsilon } => Ok(*epsilon),
            CounterFloor::Reject => Err(StatsError::NonPositiveCounter { counter, value }),
        }
    }
}

/// Received signal power in dBm.
///
/// `preamble_count` must be positive; the diagnostic format guarantees it and
/// it is not re-checked here.
pub fn received_power(
    max_growth_cir: f64,
    preamble_count: f64,
    constant: f64,
    floor: CounterFloor,
) -> Result<f64, StatsError> {
    let cir = floor.apply("MAX_GROWTH_CIR", max_growth_cir)?;
    Ok(10.0 * ((cir * CIR_SCALE) / preamble_count.powi(2)).log10() - constant)
}

/// First-path signal power in dBm.
pub fn first_path_power(
    amp1: f64,
    amp2: f64,
    amp3: f64,
    preamble_count: f64,
    constant: f64,
    floor: CounterFloor,
) -> Result<f64, StatsError> {
    let energy = floor.apply(
        "FIRST_PATH_AMP",
        amp1.powi(2) + amp2.powi(2) + amp3.powi(2),
    )?;
    Ok(10.0 * (energy / preamble_count.powi(2)).log10() - constant)
}

fn check_lengths(expected: usize, actual: usize, what: &str) -> Result<(), StatsError> {
    if expected != actual {
        return Err(StatsError::InvalidInput(format!(
            "{} has {} elements, expected {}",
            what, actual, expected
        )));
    }
    Ok(())
}

/// Element-wise received power over parallel counter sequences.
pub fn received_power_series(
    max_growth_cir: &[f64],
    preamble_count: &[f64],
    constant: f64,
    floor: CounterFloor,
) -> Result<Vec<f64>, StatsError> {
    check_lengths(max_growth_cir.len(), preamble_count.len(), "RX_PREAMBLE_CNT")?;
    max_growth_cir
        .iter()
        .zip(preamble_count)
        .map(|(&c, &n)| received_power(c, n, constant, floor))
        .collect()
}

/// Element-wise first-path power over parallel counter sequences.
pub fn first_path_power_series(
    amp1: &[f64],
    amp2: &[f64],
    amp3: &[f64],
    preamble_count: &[f64],
    constant: f64,
    floor: CounterFloor,
) -> Result<Vec<f64>, StatsError> {
    check_lengths(amp1.len(), amp2.len(), "FIRST_PATH_AMP2")?;
    check_lengths(amp1.len(), amp3.len(), "FIRST_PATH_AMP3")?;
    check_lengths(amp1.len(), preamble_count.len(), "RX_PREAMBLE_CNT")?;
    amp1.iter()
        .zip(amp2)
        .zip(amp3)
        .zip(preamble_count)
        .map(|(((&f1, &f2), &f3), &n)| first_path_power(f1, f2, f3, n, constant, floor))
        .collect()
}

/// Received power for every sample of a trial.
pub fn sample_received_power(
    samples: &[DiagnosticSample],
    constant: f64,
    floor: CounterFloor,
) -> Result<Vec<f64>, StatsError> {
    let cir: Vec<f64> = samples.iter().map(|s| s.max_growth_cir as f64).collect();
    let preamble: Vec<f64> = samples.iter().map(|s| s.rx_preamble_cnt as f64).collect();
    received_power_series(&cir, &preamble, constant, floor)
}

/// First-path power for every sample of a trial.
pub fn sample_first_path_power(
    samples: &[DiagnosticSample],
    constant: f64,
    floor: CounterFloor,
) -> Result<Vec<f64>, StatsError> {
    let amp1: Vec<f64> = samples.iter().map(|s| s.first_path_amp1 as f64).collect();
    let amp2: Vec<f64> = samples.iter().map(|s| s.first_path_amp2 as f64).collect();
    let amp3: Vec<f64> = samples.iter().map(|s| s.first_path_amp3 as f64).collect();
    let preamble: Vec<f64> = samples.iter().map(|s| s.rx_preamble_cnt as f64).collect();
    first_path_power_series(&amp1, &amp2, &amp3, &preamble, constant, floor)
}
