//! Edge List CSV
//!
//! `from,to,weight` with a header line, one row per directed edge. The
//! generator kind is not stored.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use super::adjacency::{AdjacencyBuilder, AdjacencyMatrix, MAX_NODES};
use super::NetworkError;

pub const EDGE_LIST_HEADER: &str = "from,to,weight";

pub fn write_edge_list<W: Write>(matrix: &AdjacencyMatrix, mut out: W) -> Result<(), NetworkError> {
    writeln!(out, "{}", EDGE_LIST_HEADER)?;
    for (from, to) in matrix.edges() {
        writeln!(out, "{},{},1", from, to)?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_edge_list_file(matrix: &AdjacencyMatrix, path: &Path) -> Result<(), NetworkError> {
    let file = File::create(path)?;
    write_edge_list(matrix, BufWriter::new(file))
}

/// Reads an edge list; the node count is the largest id plus one and must
/// not exceed [`MAX_NODES`].
pub fn read_edge_list<R: BufRead>(input: R) -> Result<AdjacencyMatrix, NetworkError> {
    let mut edges = Vec::new();
    for (idx, line) in input.lines().enumerate().skip(1) {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let number = idx + 1;
        let mut fields = line.split(',').map(str::trim);
        let from = parse_node(fields.next(), number, "from")?;
        let to = parse_node(fields.next(), number, "to")?;
        let weight = match fields.next() {
            Some(w) => w.parse::<f64>().map_err(|e| NetworkError::EdgeListParse {
                line: number,
                reason: format!("bad weight {:?}: {}", w, e),
            })?,
            None => 1.0,
        };
        if weight != 0.0 {
            edges.push((from, to));
        }
    }

    let n = edges
        .iter()
        .map(|&(a, b)| a.max(b) + 1)
        .max()
        .ok_or(NetworkError::EmptyEdgeList)?;
    let mut b = AdjacencyBuilder::new(n);
    for (from, to) in edges {
        b.connect_directed(from, to);
    }
    tracing::debug!(nodes = n, "edge list read");
    Ok(b.freeze())
}

pub fn read_edge_list_file(path: &Path) -> Result<AdjacencyMatrix, NetworkError> {
    let file = File::open(path)?;
    read_edge_list(BufReader::new(file))
}

fn parse_node(field: Option<&str>, line: usize, column: &str) -> Result<usize, NetworkError> {
    let raw = field.ok_or_else(|| NetworkError::EdgeListParse {
        line,
        reason: format!("missing {} column", column),
    })?;
    let id: i64 = raw.parse().map_err(|e| NetworkError::EdgeListParse {
        line,
        reason: format!("bad {} id {:?}: {}", column, raw, e),
    })?;
    let id = usize::try_from(id).map_err(|_| NetworkError::EdgeListParse {
        line,
        reason: format!("negative {} id {}", column, id),
    })?;
    if id >= MAX_NODES {
        return Err(NetworkError::EdgeListParse {
            line,
            reason: format!("{} id {} exceeds the {} node limit", column, id, MAX_NODES),
        });
    }
    Ok(id)
}
