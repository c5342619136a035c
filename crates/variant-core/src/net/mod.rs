//! Network Topology
//!
//! Adjacency matrices, topology generators, the agent-holding network and the
//! speaker-selection policies that sample from it.

pub mod adjacency;
pub mod edgelist;
pub mod factory;
pub mod network;
pub mod selection;

use thiserror::Error;

pub use adjacency::{AdjacencyBuilder, AdjacencyMatrix, MAX_NODES, NO_CONNECTION};
pub use edgelist::{read_edge_list, read_edge_list_file, write_edge_list, write_edge_list_file};
pub use factory::{
    grid_col, grid_id, grid_row, make_network, make_parochial_small_world, make_regular_torus,
    make_small_world_torus, NetworkConfig, NetworkKind,
};
pub use network::{Network, Resident, Topology};
pub use selection::{SelectionPolicy, SpeakerSet};

/// Errors raised while building or querying a network.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("grid needs at least one column and one row, got {cols}x{rows}")]
    InvalidGrid { cols: usize, rows: usize },

    #[error("rewiring probability {0} is outside [0, 1]")]
    InvalidProbability(f64),

    #[error("a parochial network needs at least two parishes, got {0}")]
    InvalidParishCount(usize),

    #[error("could not produce a connected network after {attempts} attempts")]
    RewiringExhausted { attempts: usize },

    #[error("expected {expected} agents, one per node, got {actual}")]
    AgentCountMismatch { expected: usize, actual: usize },

    #[error("node {node} is out of range for a network of {size} nodes")]
    NodeOutOfRange { node: usize, size: usize },

    #[error("node {0} holds no agent")]
    EmptySlot(usize),

    #[error("no eligible speaker for listener at node {listener}")]
    NoEligibleSpeakers { listener: usize },

    #[error("speaker set drawn at modification {stamp} resolved at modification {current}")]
    StaleSpeakerSet { stamp: u64, current: u64 },

    #[error("edge list line {line}: {reason}")]
    EdgeListParse { line: usize, reason: String },

    #[error("edge list contains no edges")]
    EmptyEdgeList,

    #[error("network of {nodes} nodes exceeds the limit of {max}")]
    TooManyNodes { nodes: usize, max: usize },

    #[error("network kind {0:?} cannot be generated")]
    UnsupportedKind(NetworkKind),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
