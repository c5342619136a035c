//! Output Records
//!
//! Rows written by the statistics sinks and the end-of-run summary.
//!
//! Every row type knows its CSV header and how to render itself, so writers
//! stay generic over the record kind.

use serde::{Deserialize, Serialize};

use crate::Gender;

/// A record that can be written as one CSV line.
pub trait CsvRecord {
    /// Column names, comma separated, without a trailing newline.
    fn header() -> &'static str;

    /// The row, comma separated, without a trailing newline.
    fn to_csv_row(&self) -> String;
}

/// Aggregate productions observed during one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    /// Milliseconds since the Unix epoch when the row was produced
    pub timestamp_ms: u64,
    pub epoch: u64,
    pub productions_a: u64,
    /// Everything not tagged A counts here
    pub productions_b: u64,
}

impl EpochRecord {
    /// Share of A among all productions, `None` if nothing was produced.
    pub fn ratio_a(&self) -> Option<f64> {
        let total = self.productions_a + self.productions_b;
        if total == 0 {
            None
        } else {
            Some(self.productions_a as f64 / total as f64)
        }
    }
}

impl CsvRecord for EpochRecord {
    fn header() -> &'static str {
        "timestamp,epoch,productionsA,productionsB"
    }

    fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{}",
            self.timestamp_ms, self.epoch, self.productions_a, self.productions_b
        )
    }
}

/// Snapshot of one agent at the end of an epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub timestamp_ms: u64,
    pub epoch: u64,
    pub node: usize,
    pub agent_id: u64,
    pub age: u32,
    pub gender: Gender,
    pub status: f64,
    /// `None` for an empty lexicon
    pub ratio_a: Option<f64>,
    pub received: u64,
    pub discarded: u64,
    pub produced: u64,
}

impl CsvRecord for AgentRecord {
    fn header() -> &'static str {
        "timestamp,epoch,nodeID,agentID,age,gender,status,ratioA,exemplars.received,exemplars.discarded,exemplars.produced"
    }

    fn to_csv_row(&self) -> String {
        let ratio = match self.ratio_a {
            Some(r) => r.to_string(),
            None => "NaN".to_string(),
        };
        format!(
            "{},{},{},{},{},{},{},{},{},{},{}",
            self.timestamp_ms,
            self.epoch,
            self.node,
            self.agent_id,
            self.age,
            self.gender,
            self.status,
            ratio,
            self.received,
            self.discarded,
            self.produced
        )
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// All configured epochs were simulated
    Completed,
    /// One variant vanished from productions long enough to stop early
    Stagnated,
}

/// End-of-run report written as JSON next to the CSV output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub seed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub network_kind: String,
    pub nodes: usize,
    pub mean_distance: f64,
    pub max_distance: usize,
    pub epochs_requested: u64,
    pub epochs_run: u64,
    pub stop_reason: StopReason,
    /// A-ratio of productions in the last simulated epoch
    pub final_ratio_a: Option<f64>,
    /// A-ratio of all productions over the run
    pub overall_ratio_a: Option<f64>,
    pub total_productions_a: u64,
    pub total_productions_b: u64,
    pub elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_record_ratio() {
        let record = EpochRecord {
            timestamp_ms: 0,
            epoch: 3,
            productions_a: 30,
            productions_b: 10,
        };
        assert_eq!(record.ratio_a(), Some(0.75));

        let empty = EpochRecord {
            productions_a: 0,
            productions_b: 0,
            ..record
        };
        assert_eq!(empty.ratio_a(), None);
    }

    #[test]
    fn test_epoch_record_csv() {
        let record = EpochRecord {
            timestamp_ms: 1700,
            epoch: 2,
            productions_a: 5,
            productions_b: 7,
        };
        assert_eq!(record.to_csv_row(), "1700,2,5,7");
        assert_eq!(EpochRecord::header().split(',').count(), 4);
    }

    #[test]
    fn test_agent_record_csv_nan_ratio() {
        let record = AgentRecord {
            timestamp_ms: 1,
            epoch: 0,
            node: 4,
            agent_id: 17,
            age: 2,
            gender: Gender::Female,
            status: 0.5,
            ratio_a: None,
            received: 10,
            discarded: 1,
            produced: 20,
        };
        assert_eq!(record.to_csv_row(), "1,0,4,17,2,f,0.5,NaN,10,1,20");
        assert_eq!(
            AgentRecord::header().split(',').count(),
            record.to_csv_row().split(',').count()
        );
    }

    #[test]
    fn test_summary_json_roundtrip() {
        let summary = RunSummary {
            seed: 42,
            tag: None,
            network_kind: "small_world".to_string(),
            nodes: 100,
            mean_distance: 4.2,
            max_distance: 9,
            epochs_requested: 50,
            epochs_run: 12,
            stop_reason: StopReason::Stagnated,
            final_ratio_a: Some(1.0),
            overall_ratio_a: Some(0.5),
            total_productions_a: 1000,
            total_productions_b: 10,
            elapsed_ms: 5,
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("\"tag\""));
        assert!(json.contains("\"stagnated\""));
        let parsed: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, summary);
    }
}
