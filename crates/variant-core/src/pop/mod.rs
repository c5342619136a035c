//! Population
//!
//! Agents, how they are created and replaced, and the per-epoch interaction
//! engine that lets them talk to each other.

pub mod agent;
pub mod factory;
pub mod input;
pub mod interaction;
pub mod rng;

use thiserror::Error;

use crate::mem::LexiconError;
use crate::net::{Network, NetworkError};

pub use agent::{Agent, AgentCounters};
pub use factory::{load_prototypes, AgentFactory, PopulationConfig, PrototypeConfig};
pub use input::{read_agents, read_agents_file};
pub use interaction::{EpochOutcome, Interaction, Productions};
pub use rng::{Phase, SeedSource};

/// A network populated with agents.
pub type Population = Network<Agent>;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Lexicon(#[from] LexiconError),

    #[error("agent CSV line {line}: {reason}")]
    CsvParse { line: usize, reason: String },

    #[error("invalid prototypes: {0}")]
    Prototypes(String),

    #[error("initial lexicon of {size} exemplars exceeds capacity {capacity}")]
    LexiconOverflow { size: usize, capacity: usize },

    #[error("initial A ratio {0} is outside [0, 1]")]
    InitialRatio(f64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("epoch {epoch} was already run (last run epoch {last})")]
    EpochReplayed { epoch: u64, last: u64 },

    #[error("speaker selection failed: {0}")]
    Selection(#[from] NetworkError),

    #[error("production failed: {0}")]
    Production(#[from] LexiconError),

    #[error("could not build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
