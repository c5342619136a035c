//! Run Statistics
//!
//! Accumulates epoch records over a run and produces the JSON summary.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use variant_events::{EpochRecord, RunSummary, StopReason};

use super::OutputError;

/// Running totals over all simulated epochs.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub epochs_run: u64,
    pub total_productions_a: u64,
    pub total_productions_b: u64,
    pub faults: usize,
    pub last: Option<EpochRecord>,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_epoch(&mut self, record: &EpochRecord, faults: usize) {
        self.epochs_run += 1;
        self.total_productions_a += record.productions_a;
        self.total_productions_b += record.productions_b;
        self.faults += faults;
        self.last = Some(*record);
    }

    pub fn final_ratio_a(&self) -> Option<f64> {
        self.last.as_ref().and_then(EpochRecord::ratio_a)
    }

    /// Share of A over the whole run.
    pub fn overall_ratio_a(&self) -> Option<f64> {
        let total = self.total_productions_a + self.total_productions_b;
        if total == 0 {
            None
        } else {
            Some(self.total_productions_a as f64 / total as f64)
        }
    }

    pub fn fill_summary(&self, summary: &mut RunSummary, stop_reason: StopReason) {
        summary.epochs_run = self.epochs_run;
        summary.stop_reason = stop_reason;
        summary.final_ratio_a = self.final_ratio_a();
        summary.overall_ratio_a = self.overall_ratio_a();
        summary.total_productions_a = self.total_productions_a;
        summary.total_productions_b = self.total_productions_b;
    }
}

/// Writes the summary as pretty JSON.
pub fn write_summary(summary: &RunSummary, path: &Path) -> Result<(), OutputError> {
    let file = File::create(path).map_err(|e| OutputError::io(path, e))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, summary)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(epoch: u64, a: u64, b: u64) -> EpochRecord {
        EpochRecord {
            timestamp_ms: 0,
            epoch,
            productions_a: a,
            productions_b: b,
        }
    }

    #[test]
    fn test_totals_and_ratios() {
        let mut stats = RunStats::new();
        assert_eq!(stats.final_ratio_a(), None);
        stats.record_epoch(&record(0, 3, 1), 0);
        stats.record_epoch(&record(1, 4, 0), 2);
        assert_eq!(stats.epochs_run, 2);
        assert_eq!(stats.faults, 2);
        assert_eq!(stats.final_ratio_a(), Some(1.0));
        assert_eq!(stats.overall_ratio_a(), Some(7.0 / 8.0));
    }

    #[test]
    fn test_summary_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        let mut stats = RunStats::new();
        stats.record_epoch(&record(0, 1, 1), 0);
        stats.record_epoch(&record(1, 3, 1), 0);
        let mut summary = RunSummary {
            seed: 1,
            tag: Some("t".into()),
            network_kind: "regular".into(),
            nodes: 4,
            mean_distance: 1.3,
            max_distance: 2,
            epochs_requested: 10,
            epochs_run: 0,
            stop_reason: StopReason::Completed,
            final_ratio_a: None,
            overall_ratio_a: None,
            total_productions_a: 0,
            total_productions_b: 0,
            elapsed_ms: 0,
        };
        stats.fill_summary(&mut summary, StopReason::Completed);
        write_summary(&summary, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: RunSummary = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.epochs_run, 2);
        assert_eq!(parsed.final_ratio_a, Some(0.75));
        assert_eq!(parsed.overall_ratio_a, Some(4.0 / 6.0));
    }
}
