//! Statistics Sinks
//!
//! Where per-epoch and per-agent records go. CSV writers for real runs, an
//! in-memory collector for tests and embedding.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use variant_events::{AgentRecord, CsvRecord, EpochRecord};

use super::OutputError;

pub trait EpochSink {
    fn record_epoch(&mut self, record: &EpochRecord) -> Result<(), OutputError>;

    fn flush(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}

pub trait AgentSink {
    /// All agent snapshots taken at the end of `epoch`.
    fn record_agents(&mut self, epoch: u64, records: &[AgentRecord]) -> Result<(), OutputError>;
}

/// Buffered CSV writer for one record type. The header is written on
/// creation.
pub struct CsvWriter<T> {
    writer: Option<BufWriter<File>>,
    rows: u64,
    _record: PhantomData<fn(&T)>,
}

impl<T: CsvRecord> CsvWriter<T> {
    pub fn create(path: &Path) -> Result<Self, OutputError> {
        let file = File::create(path).map_err(|e| OutputError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", T::header())?;
        Ok(Self {
            writer: Some(writer),
            rows: 0,
            _record: PhantomData,
        })
    }

    /// A writer that discards rows (for testing)
    pub fn null() -> Self {
        Self {
            writer: None,
            rows: 0,
            _record: PhantomData,
        }
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn write(&mut self, record: &T) -> Result<(), OutputError> {
        self.rows += 1;
        if let Some(ref mut writer) = self.writer {
            writeln!(writer, "{}", record.to_csv_row())?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), OutputError> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

impl<T> Drop for CsvWriter<T> {
    fn drop(&mut self) {
        if let Some(ref mut writer) = self.writer {
            if let Err(e) = writer.flush() {
                tracing::error!(error = %e, "failed to flush CSV writer");
            }
        }
    }
}

impl EpochSink for CsvWriter<EpochRecord> {
    fn record_epoch(&mut self, record: &EpochRecord) -> Result<(), OutputError> {
        self.write(record)
    }

    fn flush(&mut self) -> Result<(), OutputError> {
        CsvWriter::flush(self)
    }
}

/// One `<prefix>agents_<epoch>.csv` per snapshot epoch.
#[derive(Debug, Clone)]
pub struct AgentCsvDir {
    dir: PathBuf,
    prefix: String,
}

impl AgentCsvDir {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn path_for(&self, epoch: u64) -> PathBuf {
        self.dir.join(format!("{}agents_{:06}.csv", self.prefix, epoch))
    }
}

impl AgentSink for AgentCsvDir {
    fn record_agents(&mut self, epoch: u64, records: &[AgentRecord]) -> Result<(), OutputError> {
        let path = self.path_for(epoch);
        let mut writer = CsvWriter::create(&path)?;
        for record in records {
            writer.write(record)?;
        }
        writer.flush()?;
        tracing::debug!(epoch, agents = records.len(), path = %path.display(), "agent snapshot written");
        Ok(())
    }
}

/// Keeps every record in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub epochs: Vec<EpochRecord>,
    pub agents: Vec<AgentRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Epochs at which agent snapshots were taken, ascending and unique.
    pub fn agent_epochs(&self) -> Vec<u64> {
        let mut epochs: Vec<u64> = self.agents.iter().map(|r| r.epoch).collect();
        epochs.dedup();
        epochs
    }
}

impl EpochSink for MemorySink {
    fn record_epoch(&mut self, record: &EpochRecord) -> Result<(), OutputError> {
        self.epochs.push(*record);
        Ok(())
    }
}

impl AgentSink for MemorySink {
    fn record_agents(&mut self, _epoch: u64, records: &[AgentRecord]) -> Result<(), OutputError> {
        self.agents.extend_from_slice(records);
        Ok(())
    }
}
