//! Statistical analysis of ranging samples
//!
//! This module provides the descriptive statistics applied to every numeric
//! column of a distance trial.
//!
//! # Examples
//!
//! ```
//! use uwb_stats::stats::{mean, Summary};
//!
//! let ranges = vec![9.8, 10.1, 10.3];
//! let summary = Summary::from_samples(&ranges).unwrap();
//! assert!((summary.mean - mean(&ranges).unwrap()).abs() < 1e-12);
//! println!("Median: {}, stddev: {}", summary.median, summary.std_dev);
//! ```

pub mod descriptive;

pub use descriptive::{mean, median, percentile, std_dev, variance, Summary};
