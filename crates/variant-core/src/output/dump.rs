//! Lexicon Dumps
//!
//! Writes every agent's lexicon, oldest exemplar first, to
//! `<prefix>lexicon_<epoch>_<agent>.csv`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::mem::csv::write_exemplars;
use crate::pop::Population;

use super::OutputError;

#[derive(Debug, Clone)]
pub struct LexiconDumper {
    dir: PathBuf,
    prefix: String,
}

impl LexiconDumper {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn path_for(&self, epoch: u64, agent_id: u64) -> PathBuf {
        self.dir
            .join(format!("{}lexicon_{:06}_{}.csv", self.prefix, epoch, agent_id))
    }

    /// Returns the number of files written.
    pub fn dump(&self, epoch: u64, population: &Population) -> Result<usize, OutputError> {
        let mut written = 0;
        for (_, agent) in population.agents() {
            let path = self.path_for(epoch, agent.id());
            let file = File::create(&path).map_err(|e| OutputError::io(&path, e))?;
            let mut out = BufWriter::new(file);
            let lexicon = agent.lexicon();
            write_exemplars(&mut out, lexicon.dims(), lexicon.iter())?;
            out.flush()?;
            written += 1;
        }
        tracing::debug!(epoch, files = written, "lexicons dumped");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::ExemplarConfig;
    use crate::net::{make_regular_torus, Network, NetworkKind, Topology};
    use crate::pop::{load_prototypes, AgentFactory, PopulationConfig, PrototypeConfig};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::fs;

    #[test]
    fn test_dump_writes_one_file_per_agent() {
        let exemplar = ExemplarConfig::default();
        let prototypes = load_prototypes(&PrototypeConfig::default(), &exemplar).unwrap();
        let config = PopulationConfig {
            lexicon_capacity: 6,
            initial_lexicon_size: 4,
            ..Default::default()
        };
        let mut factory = AgentFactory::new(config, exemplar, prototypes);
        let mut rng = SmallRng::seed_from_u64(1);
        let matrix = make_regular_torus(2, 2).unwrap();
        let mut net = Network::new(Topology::new(matrix, NetworkKind::Regular));
        net.set_agents(factory.populate(4, &mut rng).unwrap()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let dumper = LexiconDumper::new(dir.path(), "");
        assert_eq!(dumper.dump(3, &net).unwrap(), 4);

        let text = fs::read_to_string(dumper.path_for(3, 1)).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("type,speaker_status,speaker_gender,closeness,phon_0"));
        assert_eq!(lines[1].split(',').count(), 4 + 5);
    }
}
