//! Packet-reception accounting across the stages of a ranging exchange.
//!
//! Drop counts are summed per stage and turned into reception totals. The
//! final-stage drops are tallied but do not enter the reception totals.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StatsError;
use crate::types::{DropStage, ExchangeDropRecord, TwrMode};

/// Drop counts summed per exchange stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDrops {
    pub failed_polls: u64,
    pub failed_responses: u64,
    pub failed_finals: u64,
    pub failed_reports: u64,
}

impl StageDrops {
    pub fn from_records(records: &[ExchangeDropRecord]) -> Result<Self, StatsError> {
        let mut drops = StageDrops::default();
        for record in records {
            drops.add(record.stage, record.count)?;
        }
        Ok(drops)
    }

    /// Add a drop count to its stage; fails if the stage total overflows.
    pub fn add(&mut self, stage: DropStage, count: u64) -> Result<(), StatsError> {
        let slot = match stage {
            DropStage::Poll => &mut self.failed_polls,
            DropStage::Response => &mut self.failed_responses,
            DropStage::Final => &mut self.failed_finals,
            DropStage::Report => &mut self.failed_reports,
        };
        *slot = slot
            .checked_add(count)
            .ok_or_else(|| overflow(&format!("{} drop count", stage)))?;
        Ok(())
    }
}

fn overflow(what: &str) -> StatsError {
    StatsError::InvalidInput(format!("{} overflows a 64-bit counter", what))
}

/// Reception totals for one distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReceptionSummary {
    pub drops: StageDrops,
    pub successful: u64,
    pub dropped: u64,
    pub total: u64,
    /// Packet reception rate in percent
    pub prr: f64,
}

/// Turns per-stage drop counts into reception totals for one ranging mode.
#[derive(Debug, Clone, Copy)]
pub struct ReceptionAccountant {
    mode: TwrMode,
}

impl ReceptionAccountant {
    pub fn new(mode: TwrMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> TwrMode {
        self.mode
    }

    /// Account for the drops of one trial.
    ///
    /// `sample_count` is the number of completed exchanges. Every record must
    /// carry the accountant's ranging mode.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if a record disagrees on the ranging mode
    /// - `InvalidInput` if a count or total overflows
    /// - `DivisionByZero` if no reception was attempted at all
    pub fn account(
        &self,
        records: &[ExchangeDropRecord],
        sample_count: usize,
    ) -> Result<ReceptionSummary, StatsError> {
        if let Some(record) = records
            .iter()
            .find(|r| r.double_sided != self.mode.is_double_sided())
        {
            return Err(StatsError::InvalidInput(format!(
                "{} drop record does not match {} ranging",
                record.stage, self.mode
            )));
        }

        let drops = StageDrops::from_records(records)?;
        let successful = self
            .mode
            .receptions_per_exchange()
            .checked_mul(sample_count as u64)
            .and_then(|n| n.checked_add(drops.failed_reports))
            .ok_or_else(|| overflow("successful receptions"))?;
        let dropped = drops
            .failed_responses
            .checked_add(drops.failed_reports)
            .ok_or_else(|| overflow("dropped receptions"))?;
        let total = successful
            .checked_add(dropped)
            .ok_or_else(|| overflow("total receptions"))?;

        if total == 0 {
            return Err(StatsError::DivisionByZero("total receptions"));
        }

        let prr = (1.0 - dropped as f64 / total as f64) * 100.0;
        debug!(successful, dropped, total, prr, "Reception accounting complete");

        Ok(ReceptionSummary {
            drops,
            successful,
            dropped,
            total,
            prr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn records(double_sided: bool, counts: [u64; 4]) -> Vec<ExchangeDropRecord> {
        DropStage::ALL
            .iter()
            .zip(counts)
            .map(|(&stage, count)| ExchangeDropRecord::new(stage, count, double_sided))
            .collect()
    }

    #[test]
    fn test_double_sided_reference_example() {
        let accountant = ReceptionAccountant::new(TwrMode::DoubleSided);
        let summary = accountant.account(&records(true, [0, 5, 0, 2]), 100).unwrap();

        assert_eq!(summary.successful, 202);
        assert_eq!(summary.dropped, 7);
        assert_eq!(summary.total, 209);
        assert!((summary.prr - (1.0 - 7.0 / 209.0) * 100.0).abs() < 1e-12);
        assert!((summary.prr - 96.65).abs() < 0.01);
    }

    #[test]
    fn test_single_sided_uses_one_reception_per_exchange() {
        let accountant = ReceptionAccountant::new(TwrMode::SingleSided);
        let summary = accountant.account(&records(false, [0, 5, 0, 2]), 100).unwrap();

        assert_eq!(summary.successful, 102);
        assert_eq!(summary.total, 109);
    }

    #[test]
    fn test_finals_and_polls_do_not_enter_totals() {
        let accountant = ReceptionAccountant::new(TwrMode::DoubleSided);
        let with = accountant.account(&records(true, [9, 1, 40, 1]), 10).unwrap();
        let without = accountant.account(&records(true, [0, 1, 0, 1]), 10).unwrap();

        assert_eq!(with.total, without.total);
        assert_eq!(with.prr, without.prr);
        assert_eq!(with.drops.failed_finals, 40);
        assert_eq!(with.drops.failed_polls, 9);
    }

    #[test]
    fn test_repeated_stage_records_are_summed() {
        let mut recs = records(true, [0, 1, 0, 1]);
        recs.extend(records(true, [0, 2, 0, 3]));
        let drops = StageDrops::from_records(&recs).unwrap();
        assert_eq!(drops.failed_responses, 3);
        assert_eq!(drops.failed_reports, 4);
    }

    #[test]
    fn test_zero_exchanges_is_division_by_zero() {
        let accountant = ReceptionAccountant::new(TwrMode::DoubleSided);
        let result = accountant.account(&records(true, [0, 0, 0, 0]), 0);
        assert_eq!(result, Err(StatsError::DivisionByZero("total receptions")));
    }

    #[test]
    fn test_only_poll_drops_is_still_division_by_zero() {
        let accountant = ReceptionAccountant::new(TwrMode::DoubleSided);
        let result = accountant.account(&records(true, [12, 0, 3, 0]), 0);
        assert!(matches!(result, Err(StatsError::DivisionByZero(_))));
    }

    #[test]
    fn test_all_dropped_gives_zero_prr() {
        let accountant = ReceptionAccountant::new(TwrMode::SingleSided);
        let summary = accountant.account(&records(false, [0, 4, 0, 0]), 0).unwrap();
        assert_eq!(summary.prr, 0.0);
    }

    #[test]
    fn test_huge_report_count_is_invalid_input() {
        let accountant = ReceptionAccountant::new(TwrMode::DoubleSided);
        let result = accountant.account(&records(true, [0, 0, 0, u64::MAX]), 2);
        assert!(matches!(result, Err(StatsError::InvalidInput(_))));
    }

    #[test]
    fn test_stage_sum_overflow_is_invalid_input() {
        let mut recs = records(true, [0, u64::MAX, 0, 0]);
        recs.extend(records(true, [0, 1, 0, 0]));
        assert!(matches!(
            StageDrops::from_records(&recs),
            Err(StatsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_mode_mismatch_is_invalid_input() {
        let accountant = ReceptionAccountant::new(TwrMode::DoubleSided);
        let result = accountant.account(&records(false, [0, 1, 0, 0]), 10);
        assert!(matches!(result, Err(StatsError::InvalidInput(_))));
    }
}
