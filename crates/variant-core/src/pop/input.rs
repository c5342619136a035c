//! Agent CSV Input
//!
//! `node_id,agent_id,status,isStar,age,lex_limit,lex_size,lex_file,ratio_A,gender`
//!
//! An empty `lex_file` generates `lex_size` exemplars from the prototypes at
//! the given A-ratio; otherwise the lexicon is read from that exemplar CSV
//! (relative paths resolve against the agent file's directory).

use rand::Rng;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use variant_events::Gender;

use crate::mem::csv::read_exemplars_file;
use crate::mem::{ExemplarConfig, Lexicon};

use super::agent::Agent;
use super::factory::AgentFactory;
use super::AgentError;

const COLUMNS: usize = 10;

/// Parses agents, returned in node order.
pub fn read_agents<B: BufRead, R: Rng + ?Sized>(
    input: B,
    base_dir: &Path,
    factory: &mut AgentFactory,
    exemplar: &ExemplarConfig,
    rng: &mut R,
) -> Result<Vec<Agent>, AgentError> {
    let mut agents = Vec::new();
    for (idx, line) in input.lines().enumerate().skip(1) {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let number = idx + 1;
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != COLUMNS {
            return Err(AgentError::CsvParse {
                line: number,
                reason: format!("expected {} columns, found {}", COLUMNS, fields.len()),
            });
        }
        let bad = |column: &str, raw: &str| AgentError::CsvParse {
            line: number,
            reason: format!("bad {} {:?}", column, raw),
        };

        let node: usize = fields[0].parse().map_err(|_| bad("node_id", fields[0]))?;
        let id: u64 = fields[1].parse().map_err(|_| bad("agent_id", fields[1]))?;
        let status: f64 = fields[2].parse().map_err(|_| bad("status", fields[2]))?;
        let star: bool = fields[3]
            .to_ascii_lowercase()
            .parse()
            .map_err(|_| bad("isStar", fields[3]))?;
        let age: u32 = fields[4].parse().map_err(|_| bad("age", fields[4]))?;
        let capacity: usize = fields[5].parse().map_err(|_| bad("lex_limit", fields[5]))?;
        let size: usize = fields[6].parse().map_err(|_| bad("lex_size", fields[6]))?;
        let lex_file = fields[7];
        let ratio_a: f64 = fields[8].parse().map_err(|_| bad("ratio_A", fields[8]))?;
        let gender: Gender = fields[9].parse().map_err(|_| bad("gender", fields[9]))?;

        let lexicon = if lex_file.is_empty() {
            factory
                .generate_lexicon(capacity, size, ratio_a, rng)
                .map_err(|e| match e {
                    AgentError::LexiconOverflow { .. } | AgentError::InitialRatio(_) => {
                        AgentError::CsvParse {
                            line: number,
                            reason: e.to_string(),
                        }
                    }
                    other => other,
                })?
        } else {
            let mut lexicon = Lexicon::from_config(capacity, exemplar)?;
            let tools = *lexicon.tools();
            let rows = read_exemplars_file(&base_dir.join(lex_file), lexicon.dims(), &tools)?;
            if rows.len() > capacity {
                return Err(AgentError::CsvParse {
                    line: number,
                    reason: format!(
                        "{} has {} exemplars, lex_limit is {}",
                        lex_file,
                        rows.len(),
                        capacity
                    ),
                });
            }
            for e in rows {
                lexicon.add(e)?;
            }
            lexicon
        };

        agents.push(factory.init_agent(id, node, age, gender, status, star, lexicon));
    }
    agents.sort_by_key(Agent::node);
    tracing::info!(agents = agents.len(), "agents read");
    Ok(agents)
}

pub fn read_agents_file<R: Rng + ?Sized>(
    path: &Path,
    factory: &mut AgentFactory,
    exemplar: &ExemplarConfig,
    rng: &mut R,
) -> Result<Vec<Agent>, AgentError> {
    let file = File::open(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    read_agents(BufReader::new(file), base_dir, factory, exemplar, rng)
}
