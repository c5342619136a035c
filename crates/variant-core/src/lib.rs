//! Exemplar-theoretic simulation of two competing variants on a social network.
//!
//! Agents sit on the nodes of a torus-based network, store heard tokens of
//! variant A or B as exemplars, and reproduce them to their neighbours. The
//! [`sim::Simulation`] runner drives the epochs and writes per-epoch results.

pub mod config;
pub mod mem;
pub mod net;
pub mod output;
pub mod pop;
pub mod sim;

use thiserror::Error;

pub use config::{ConfigError, SimConfig};
pub use mem::{Exemplar, ExemplarTools, Lexicon, LexiconError};
pub use net::{
    make_network, Network, NetworkConfig, NetworkError, NetworkKind, SelectionPolicy, Topology,
};
pub use output::OutputError;
pub use pop::{
    Agent, AgentError, AgentFactory, Interaction, InteractionError, Population, SeedSource,
};
pub use sim::Simulation;
pub use variant_events::{Gender, Variant};

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Lexicon(#[from] LexiconError),
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error(transparent)]
    Interaction(#[from] InteractionError),
    #[error(transparent)]
    Output(#[from] OutputError),
    #[error("agent for node {found} listed at position {node}")]
    Placement { node: usize, found: usize },
}
