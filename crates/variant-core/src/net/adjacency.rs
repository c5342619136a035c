//! Adjacency Matrix
//!
//! Dense 0/1 adjacency matrix with lazily computed all-pairs shortest paths.
//!
//! Distances are found by repeated boolean multiplication of the reachability
//! matrix with the base matrix: after `k` products, a set bit at `(i, j)` means
//! a walk of length `k` exists, so the first `k` that sets a cell is its
//! shortest path length. Rows are packed into `u64` words so one product step
//! costs `n²·n/64` word operations.

use std::fmt;
use std::sync::OnceLock;

/// Distance sentinel for "no path" (also used on the diagonal).
pub const NO_CONNECTION: usize = 0;

/// Largest supported network. Matrices are dense, so memory grows with the
/// square of this.
pub const MAX_NODES: usize = 1 << 16;

/// Immutable adjacency matrix of an `n`-node network.
#[derive(Clone)]
pub struct AdjacencyMatrix {
    n: usize,
    cells: Vec<u8>,
    paths: OnceLock<Paths>,
}

#[derive(Debug, Clone)]
struct Paths {
    table: Vec<usize>,
    max: usize,
    mean: f64,
    missing: usize,
}

impl AdjacencyMatrix {
    /// An `n`-node matrix without edges.
    pub fn empty(n: usize) -> Self {
        Self::from_cells(n, vec![0; n * n])
    }

    fn from_cells(n: usize, cells: Vec<u8>) -> Self {
        Self {
            n,
            cells,
            paths: OnceLock::new(),
        }
    }

    /// Number of nodes.
    pub fn size(&self) -> usize {
        self.n
    }

    pub fn is_connected(&self, i: usize, j: usize) -> bool {
        i < self.n && j < self.n && self.cells[i * self.n + j] != 0
    }

    /// Nodes adjacent to `i`, ascending.
    pub fn neighbors(&self, i: usize) -> Vec<usize> {
        if i >= self.n {
            return Vec::new();
        }
        let row = &self.cells[i * self.n..(i + 1) * self.n];
        row.iter()
            .enumerate()
            .filter(|&(_, &c)| c != 0)
            .map(|(j, _)| j)
            .collect()
    }

    /// Directed `(from, to)` pairs in row-major order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.n;
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c != 0)
            .map(move |(idx, _)| (idx / n, idx % n))
    }

    /// Number of directed edges (an undirected edge counts twice).
    pub fn edge_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != 0).count()
    }

    /// Shortest path length from `i` to `j`, or [`NO_CONNECTION`].
    pub fn distance(&self, i: usize, j: usize) -> usize {
        if i >= self.n || j >= self.n {
            return NO_CONNECTION;
        }
        self.paths().table[i * self.n + j]
    }

    pub fn max_distance(&self) -> usize {
        self.paths().max
    }

    /// Mean over all connected ordered pairs, 0 when there are none.
    pub fn mean_distance(&self) -> f64 {
        self.paths().mean
    }

    /// Whether every node reaches every other node.
    pub fn is_fully_connected(&self) -> bool {
        self.paths().missing == 0
    }

    /// First ordered pair `(i, j)`, `i != j`, without a path.
    pub fn first_unreachable_pair(&self) -> Option<(usize, usize)> {
        let paths = self.paths();
        if paths.missing == 0 {
            return None;
        }
        first_unreachable(self.n, &paths.table)
    }

    /// Mutable working copy.
    pub fn to_builder(&self) -> AdjacencyBuilder {
        AdjacencyBuilder {
            n: self.n,
            cells: self.cells.clone(),
        }
    }

    fn paths(&self) -> &Paths {
        self.paths.get_or_init(|| {
            let paths = shortest_paths(self.n, &self.cells);
            if paths.missing > 0 {
                tracing::debug!(
                    nodes = self.n,
                    unreachable_pairs = paths.missing,
                    "adjacency matrix is not fully connected"
                );
            }
            paths
        })
    }
}

impl PartialEq for AdjacencyMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.n == other.n && self.cells == other.cells
    }
}

impl Eq for AdjacencyMatrix {}

impl fmt::Debug for AdjacencyMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdjacencyMatrix")
            .field("n", &self.n)
            .field("edges", &self.edge_count())
            .finish()
    }
}

/// Mutable adjacency matrix used while a topology is being generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjacencyBuilder {
    n: usize,
    cells: Vec<u8>,
}

impl AdjacencyBuilder {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            cells: vec![0; n * n],
        }
    }

    pub fn size(&self) -> usize {
        self.n
    }

    /// Adds the undirected edge `i - j`.
    pub fn connect(&mut self, i: usize, j: usize) {
        self.cells[i * self.n + j] = 1;
        self.cells[j * self.n + i] = 1;
    }

    /// Adds only the directed edge `i -> j`.
    pub fn connect_directed(&mut self, i: usize, j: usize) {
        self.cells[i * self.n + j] = 1;
    }

    /// Removes the undirected edge `i - j`.
    pub fn disconnect(&mut self, i: usize, j: usize) {
        self.cells[i * self.n + j] = 0;
        self.cells[j * self.n + i] = 0;
    }

    pub fn is_connected(&self, i: usize, j: usize) -> bool {
        self.cells[i * self.n + j] != 0
    }

    /// Copies `block` onto the diagonal starting at node `offset`.
    pub fn insert_block(&mut self, offset: usize, block: &AdjacencyMatrix) {
        let m = block.n;
        for i in 0..m {
            let src = &block.cells[i * m..(i + 1) * m];
            let start = (offset + i) * self.n + offset;
            self.cells[start..start + m].copy_from_slice(src);
        }
    }

    /// First ordered pair without a path, computed from scratch.
    pub fn first_unreachable_pair(&self) -> Option<(usize, usize)> {
        let paths = shortest_paths(self.n, &self.cells);
        if paths.missing == 0 {
            None
        } else {
            first_unreachable(self.n, &paths.table)
        }
    }

    pub fn freeze(self) -> AdjacencyMatrix {
        AdjacencyMatrix::from_cells(self.n, self.cells)
    }
}

fn first_unreachable(n: usize, table: &[usize]) -> Option<(usize, usize)> {
    (0..n)
        .flat_map(|i| (0..n).map(move |j| (i, j)))
        .find(|&(i, j)| i != j && table[i * n + j] == NO_CONNECTION)
}

type BitRow = Vec<u64>;

fn bit_rows(n: usize, cells: &[u8]) -> Vec<BitRow> {
    let words = n.div_ceil(64);
    (0..n)
        .map(|i| {
            let mut row = vec![0u64; words];
            for j in 0..n {
                if cells[i * n + j] != 0 {
                    row[j / 64] |= 1u64 << (j % 64);
                }
            }
            row
        })
        .collect()
}

fn has_bit(row: &[u64], j: usize) -> bool {
    row[j / 64] & (1u64 << (j % 64)) != 0
}

/// One boolean product step: `next[i] = OR { base[j] : walk[i][j] }`.
fn multiply(walk: &[BitRow], base: &[BitRow]) -> Vec<BitRow> {
    let n = walk.len();
    walk.iter()
        .map(|row| {
            let mut next = vec![0u64; row.len()];
            for j in (0..n).filter(|&j| has_bit(row, j)) {
                for (out, word) in next.iter_mut().zip(&base[j]) {
                    *out |= word;
                }
            }
            next
        })
        .collect()
}

fn shortest_paths(n: usize, cells: &[u8]) -> Paths {
    let mut table = vec![NO_CONNECTION; n * n];
    let mut missing = n * n - n;

    for i in 0..n {
        for j in 0..n {
            if i != j && cells[i * n + j] != 0 {
                table[i * n + j] = 1;
                missing -= 1;
            }
        }
    }

    let base = bit_rows(n, cells);
    let mut walk = base.clone();
    for k in 2..n {
        if missing == 0 {
            break;
        }
        walk = multiply(&walk, &base);
        for (i, row) in walk.iter().enumerate() {
            for j in 0..n {
                let cell = &mut table[i * n + j];
                if i != j && *cell == NO_CONNECTION && has_bit(row, j) {
                    *cell = k;
                    missing -= 1;
                }
            }
        }
    }

    let (sum, count, max) = table
        .iter()
        .filter(|&&d| d != NO_CONNECTION)
        .fold((0usize, 0usize, 0usize), |(s, c, m), &d| (s + d, c + 1, m.max(d)));
    let mean = if count == 0 { 0.0 } else { sum as f64 / count as f64 };

    Paths {
        table,
        max,
        mean,
        missing,
    }
}
