//! Topology Generators
//!
//! Regular toruses, small-world toruses (randomly rewired, repaired until
//! connected) and parochial networks made of linked small-world parishes.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::adjacency::{AdjacencyBuilder, AdjacencyMatrix, MAX_NODES};
use super::edgelist::read_edge_list_file;
use super::network::Topology;
use super::NetworkError;

/// How a topology was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkKind {
    Regular,
    #[default]
    SmallWorld,
    Parochial,
    /// Loaded from an edge list; the generator is unknown
    Undefined,
}

impl NetworkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NetworkKind::Regular => "regular",
            NetworkKind::SmallWorld => "small_world",
            NetworkKind::Parochial => "parochial",
            NetworkKind::Undefined => "undefined",
        }
    }
}

/// Network section of the simulation config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Generator to use when no edge list is given
    pub kind: NetworkKind,
    /// Grid columns (per parish for parochial networks)
    pub cols: usize,
    /// Grid rows (per parish for parochial networks)
    pub rows: usize,
    pub parishes: usize,
    /// Per-edge rewiring probability for small-world generators
    pub rewire_probability: f64,
    /// Full rewiring restarts before giving up
    pub max_rewire_attempts: usize,
    /// Load the topology from this `from,to,weight` CSV instead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edges_file: Option<PathBuf>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            kind: NetworkKind::SmallWorld,
            cols: 10,
            rows: 10,
            parishes: 2,
            rewire_probability: 0.1,
            max_rewire_attempts: 3,
            edges_file: None,
        }
    }
}

/// Node id of grid cell `(col, row)`.
pub fn grid_id(col: usize, row: usize, cols: usize) -> usize {
    row * cols + col
}

pub fn grid_row(id: usize, cols: usize) -> usize {
    id / cols
}

pub fn grid_col(id: usize, cols: usize) -> usize {
    id % cols
}

/// Builds the topology described by `config`.
pub fn make_network<R: Rng + ?Sized>(
    config: &NetworkConfig,
    rng: &mut R,
) -> Result<Topology, NetworkError> {
    if let Some(path) = &config.edges_file {
        tracing::info!(path = %path.display(), "reading network edge list");
        let matrix = read_edge_list_file(path)?;
        return Ok(Topology::new(matrix, NetworkKind::Undefined));
    }

    let matrix = match config.kind {
        NetworkKind::Regular => make_regular_torus(config.cols, config.rows)?,
        NetworkKind::SmallWorld => make_small_world_torus(
            config.cols,
            config.rows,
            config.rewire_probability,
            config.max_rewire_attempts,
            rng,
        )?,
        NetworkKind::Parochial => make_parochial_small_world(
            config.cols,
            config.rows,
            config.rewire_probability,
            config.parishes,
            config.max_rewire_attempts,
            rng,
        )?,
        NetworkKind::Undefined => return Err(NetworkError::UnsupportedKind(config.kind)),
    };

    tracing::info!(
        kind = config.kind.as_str(),
        nodes = matrix.size(),
        edges = matrix.edge_count() / 2,
        mean_distance = matrix.mean_distance(),
        max_distance = matrix.max_distance(),
        "network generated"
    );
    Ok(Topology::new(matrix, config.kind))
}

/// `a·b` nodes, rejected beyond [`MAX_NODES`].
fn node_count(a: usize, b: usize) -> Result<usize, NetworkError> {
    match a.checked_mul(b) {
        Some(nodes) if nodes <= MAX_NODES => Ok(nodes),
        nodes => Err(NetworkError::TooManyNodes {
            nodes: nodes.unwrap_or(usize::MAX),
            max: MAX_NODES,
        }),
    }
}

/// 4-neighbour grid with wraparound on both axes.
pub fn make_regular_torus(cols: usize, rows: usize) -> Result<AdjacencyMatrix, NetworkError> {
    Ok(torus(cols, rows)?.freeze())
}

fn torus(cols: usize, rows: usize) -> Result<AdjacencyBuilder, NetworkError> {
    if cols < 1 || rows < 1 {
        return Err(NetworkError::InvalidGrid { cols, rows });
    }
    node_count(cols, rows)?;
    let mut b = AdjacencyBuilder::new(cols * rows);
    for id in 0..cols * rows {
        let (c, r) = (grid_col(id, cols), grid_row(id, cols));
        let right = grid_id((c + 1) % cols, r, cols);
        let down = grid_id(c, (r + 1) % rows, cols);
        let left = grid_id((c + cols - 1) % cols, r, cols);
        let up = grid_id(c, (r + rows - 1) % rows, cols);
        for other in [right, down, left, up] {
            if other != id {
                b.connect(id, other);
            }
        }
    }
    Ok(b)
}

/// Randomly rewired torus, repaired until fully connected.
pub fn make_small_world_torus<R: Rng + ?Sized>(
    cols: usize,
    rows: usize,
    p: f64,
    max_attempts: usize,
    rng: &mut R,
) -> Result<AdjacencyMatrix, NetworkError> {
    check_probability(p)?;
    let base = torus(cols, rows)?;
    for attempt in 1..=max_attempts {
        let mut work = base.clone();
        if rewire(&mut work, p, rng) {
            tracing::debug!(attempt, "small-world rewiring succeeded");
            return Ok(work.freeze());
        }
        tracing::debug!(attempt, "small-world rewiring failed, restarting from torus");
    }
    Err(NetworkError::RewiringExhausted {
        attempts: max_attempts,
    })
}

/// Small-world parishes merged block-diagonally and linked into a ring.
pub fn make_parochial_small_world<R: Rng + ?Sized>(
    cols: usize,
    rows: usize,
    p: f64,
    parishes: usize,
    max_attempts: usize,
    rng: &mut R,
) -> Result<AdjacencyMatrix, NetworkError> {
    check_probability(p)?;
    if parishes < 2 {
        return Err(NetworkError::InvalidParishCount(parishes));
    }

    let parish_size = node_count(cols, rows)?;
    let mut merged = AdjacencyBuilder::new(node_count(parish_size, parishes)?);
    for px in 0..parishes {
        let parish = make_small_world_torus(cols, rows, p, max_attempts, rng)?;
        merged.insert_block(px * parish_size, &parish);
    }

    for attempt in 1..=max_attempts {
        let mut work = merged.clone();
        for px in 0..parishes {
            let a = px * parish_size;
            let b = ((px + 1) % parishes) * parish_size;
            let node_a = a + rng.gen_range(0..parish_size);
            let node_b = b + rng.gen_range(0..parish_size);
            drop_first_edge_within(&mut work, node_a, a..a + parish_size);
            drop_first_edge_within(&mut work, node_b, b..b + parish_size);
            work.connect(node_a, node_b);
        }
        if work.first_unreachable_pair().is_none() {
            tracing::debug!(attempt, parishes, "parishes linked");
            return Ok(work.freeze());
        }
        tracing::debug!(attempt, "parish linking disconnected the network, redrawing");
    }
    Err(NetworkError::RewiringExhausted {
        attempts: max_attempts,
    })
}

fn check_probability(p: f64) -> Result<(), NetworkError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(NetworkError::InvalidProbability(p))
    }
}

fn drop_first_edge_within(b: &mut AdjacencyBuilder, node: usize, range: std::ops::Range<usize>) {
    if let Some(t) = range.into_iter().find(|&t| t != node && b.is_connected(node, t)) {
        b.disconnect(node, t);
    }
}

/// Displaced edges per source node: `(old_target, new_target)`.
type RewireLog = BTreeMap<usize, Vec<(usize, usize)>>;

/// One rewiring pass followed by the repair loop. Returns `false` when the
/// attempt has to be discarded.
fn rewire<R: Rng + ?Sized>(b: &mut AdjacencyBuilder, p: f64, rng: &mut R) -> bool {
    let n = b.size();
    if n < 3 {
        return b.first_unreachable_pair().is_none();
    }

    let mut log = RewireLog::new();
    for i in 0..n {
        for j in 0..n {
            if !b.is_connected(i, j) || rng.gen::<f64>() > p {
                continue;
            }
            let k = loop {
                let k = rng.gen_range(0..n);
                if k != i && k != j {
                    break k;
                }
            };
            if !b.is_connected(i, k) {
                log.entry(i).or_default().push((j, k));
                b.disconnect(i, j);
                b.connect(i, k);
            }
        }
    }

    let mut budget = 2 * n as i64;
    while let Some((i, j)) = b.first_unreachable_pair() {
        if budget > 0 && budget % 2 == 0 {
            tracing::trace!(i, j, "repair: connecting unreachable pair");
            b.connect(i, j);
        } else if !restore_displaced(b, &mut log, i, j, rng) {
            return false;
        }
        budget -= 1;
        if budget < 0 {
            return false;
        }
    }
    true
}

/// Undoes one logged rewiring, preferring entries of `i`, then `j`.
fn restore_displaced<R: Rng + ?Sized>(
    b: &mut AdjacencyBuilder,
    log: &mut RewireLog,
    i: usize,
    j: usize,
    rng: &mut R,
) -> bool {
    log.retain(|_, pairs| !pairs.is_empty());
    let key = if log.contains_key(&i) {
        i
    } else if log.contains_key(&j) {
        j
    } else {
        match log.keys().nth(rng.gen_range(0..log.len().max(1))) {
            Some(&k) => k,
            None => return false,
        }
    };
    let Some(pairs) = log.get_mut(&key) else {
        return false;
    };
    let (old, new) = pairs.swap_remove(rng.gen_range(0..pairs.len()));
    tracing::trace!(from = key, old, new, "repair: restoring displaced edge");
    b.disconnect(key, new);
    b.connect(key, old);
    true
}
