//! Output
//!
//! Statistics sinks, lexicon dumps and the end-of-run summary.

pub mod dump;
pub mod sink;
pub mod stats;

use thiserror::Error;

use crate::mem::LexiconError;

pub use dump::LexiconDumper;
pub use sink::{AgentCsvDir, AgentSink, CsvWriter, EpochSink, MemorySink};
pub use stats::{write_summary, RunStats};

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Write(#[from] std::io::Error),

    #[error("could not encode summary: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Lexicon(#[from] LexiconError),
}

impl OutputError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        OutputError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
