//! Exemplar Memory
//!
//! Exemplars, the fixed-capacity lexicon that stores them and the perception
//! strategies that turn heard tokens into stored percepts.

pub mod csv;
pub mod exemplar;
pub mod lexicon;
pub mod memo;
pub mod perception;
pub mod ring;

use thiserror::Error;
use variant_events::Variant;

pub use exemplar::{
    euclidean_distance, weighted_mean, Exemplar, ExemplarConfig, ExemplarTools, NoiseModel,
};
pub use lexicon::Lexicon;
pub use memo::Memo;
pub use perception::{Perception, PerceptionKind, SimilarityKernel, SimilarityKind};
pub use ring::RingBuffer;

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("lexicon is empty")]
    Empty,

    #[error("all exemplar scores are zero or negative")]
    DegenerateScores,

    #[error("lexicon capacity must be positive")]
    ZeroCapacity,

    #[error("cannot store an exemplar of variant {0}")]
    UnstorableVariant(Variant),

    #[error("exemplar has {actual} phonetic dimensions, lexicon expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("exemplar CSV line {line}: {reason}")]
    CsvParse { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
