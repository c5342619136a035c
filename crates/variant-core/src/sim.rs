//! Simulation Runner
//!
//! Builds network and population from a [`SimConfig`] and drives the epoch
//! loop: interactions, statistics, snapshots, early stopping and aging.

use std::fs;
use std::path::PathBuf;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use variant_events::{EpochRecord, RunSummary, StopReason};

use crate::config::SimConfig;
use crate::mem::NoiseModel;
use crate::net::{make_network, Network};
use crate::output::{
    write_summary, AgentCsvDir, AgentSink, CsvWriter, EpochSink, LexiconDumper, RunStats,
};
use crate::pop::{
    load_prototypes, read_agents_file, AgentFactory, Interaction, Phase, Population, SeedSource,
};
use crate::SimError;

/// Milliseconds since the Unix epoch, 0 if the clock is before it.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub struct Simulation {
    config: SimConfig,
    seeds: SeedSource,
    population: Population,
    factory: AgentFactory,
    interaction: Interaction,
    next_epoch: u64,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let seeds = config
            .simulation
            .seed
            .map_or_else(SeedSource::from_entropy, SeedSource::new);
        let mut rng = seeds.setup();
        tracing::info!(seed = seeds.seed(), "building simulation");

        let topology = make_network(&config.network, &mut rng)?;
        let prototypes = load_prototypes(&config.prototypes, &config.exemplar)?;
        let mut factory = AgentFactory::new(
            config.population.clone(),
            config.exemplar.clone(),
            prototypes,
        );
        let agents = match &config.population.agents_file {
            Some(path) => read_agents_file(path, &mut factory, &config.exemplar, &mut rng)?,
            None => factory.populate(topology.size(), &mut rng)?,
        };
        if let Some((index, agent)) = agents.iter().enumerate().find(|(i, a)| a.node() != *i) {
            return Err(SimError::Placement {
                node: index,
                found: agent.node(),
            });
        }

        let mut population = Network::new(topology);
        population.set_agents(agents)?;

        let interaction = Interaction::new(
            seeds,
            config.population.interaction,
            config.population.teachers,
            config.exemplar.utterance_size,
            NoiseModel::from_config(&config.exemplar),
            config.simulation.threads,
        )?;
        tracing::info!(
            nodes = population.size(),
            threads = interaction.threads(),
            policy = ?config.population.interaction,
            "simulation ready"
        );

        Ok(Self {
            config,
            seeds,
            population,
            factory,
            interaction,
            next_epoch: 0,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seeds.seed()
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Runs one epoch of interactions without aging the population.
    pub fn step(&mut self) -> Result<EpochRecord, SimError> {
        let epoch = self.next_epoch;
        let outcome = self
            .interaction
            .run_epoch(&mut self.population, epoch, now_ms())?;
        self.next_epoch += 1;
        Ok(outcome.record)
    }

    /// Ages every agent once, replacing those at the end of their lifespan.
    pub fn age_population(&mut self, epoch: u64) -> usize {
        let mut rng = self.seeds.stream(Phase::Aging, epoch, 0);
        let factory = &mut self.factory;
        self.population
            .increment_epoch(self.config.population.max_lifespan, |_, old| {
                factory.replace(old, &mut rng)
            })
    }

    /// Runs up to `simulation.epochs` epochs, reporting to the given sinks.
    pub fn run(
        &mut self,
        epoch_sink: &mut dyn EpochSink,
        agent_sink: &mut dyn AgentSink,
        lexicons: Option<&LexiconDumper>,
    ) -> Result<RunSummary, SimError> {
        let started = Instant::now();
        let epochs = self.config.simulation.epochs;
        let max_wait = self.config.simulation.max_wait;
        let last = epochs.saturating_sub(1);
        let mut stats = RunStats::new();
        let mut wait = 0u64;
        let mut stop_reason = StopReason::Completed;

        for _ in 0..epochs {
            let epoch = self.next_epoch;
            let outcome = self
                .interaction
                .run_epoch(&mut self.population, epoch, now_ms())?;
            self.next_epoch += 1;
            epoch_sink.record_epoch(&outcome.record)?;
            stats.record_epoch(&outcome.record, outcome.faults);

            let ratio = outcome.ratio_a();
            let one_sided = matches!(ratio, Some(r) if r == 0.0 || r == 1.0);
            let mut dumped_agents = false;
            if one_sided {
                wait += 1;
                if wait == 1 {
                    self.dump_agents(epoch, agent_sink)?;
                    dumped_agents = true;
                }
            } else {
                wait = 0;
            }
            let stagnated = one_sided && max_wait > 0 && wait >= max_wait;
            let final_epoch = stagnated || epoch == last;

            let output = &self.config.output;
            let dump_agents =
                output.dumps_agents(epoch, last) || (final_epoch && output.dump_agents_last);
            let dump_lexicons =
                output.dumps_lexicons(epoch, last) || (final_epoch && output.dump_lexicon_last);
            if dump_agents && !dumped_agents {
                self.dump_agents(epoch, agent_sink)?;
            }
            if let (true, Some(dumper)) = (dump_lexicons, lexicons) {
                dumper.dump(epoch, &self.population)?;
            }

            if epoch % 10 == 0 || final_epoch {
                tracing::info!(
                    epoch,
                    ratio_a = ?ratio,
                    faults = outcome.faults,
                    "epoch complete"
                );
            }

            if stagnated {
                tracing::warn!(epoch, wait, "one variant absent for too long, stopping early");
                stop_reason = StopReason::Stagnated;
                break;
            }
            self.age_population(epoch);
        }
        epoch_sink.flush()?;

        let mut summary = RunSummary {
            seed: self.seed(),
            tag: self.config.simulation.tag.clone(),
            network_kind: self.population.kind().as_str().to_string(),
            nodes: self.population.size(),
            mean_distance: self.population.mean_distance(),
            max_distance: self.population.max_distance(),
            epochs_requested: epochs,
            epochs_run: 0,
            stop_reason,
            final_ratio_a: None,
            overall_ratio_a: None,
            total_productions_a: 0,
            total_productions_b: 0,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        stats.fill_summary(&mut summary, stop_reason);
        if stats.faults > 0 {
            tracing::warn!(faults = stats.faults, "some listener contributions were dropped");
        }
        tracing::info!(
            epochs_run = summary.epochs_run,
            final_ratio_a = ?summary.final_ratio_a,
            stop_reason = ?summary.stop_reason,
            "simulation finished"
        );
        Ok(summary)
    }

    /// Runs with file output under `output.dir`: the effective config,
    /// epoch CSV, agent snapshots, lexicon dumps and `summary.json`.
    pub fn run_to_dir(&mut self) -> Result<RunSummary, SimError> {
        let dir = self.config.output.dir.clone();
        let prefix = self.config.output.prefix.clone();
        fs::create_dir_all(&dir).map_err(|e| crate::output::OutputError::io(&dir, e))?;

        let config_path = dir.join(format!("{}config.toml", prefix));
        let mut effective = self.config.clone();
        effective.simulation.seed = Some(self.seed());
        fs::write(&config_path, effective.to_toml()?)
            .map_err(|e| crate::output::OutputError::io(&config_path, e))?;

        let epochs_path = dir.join(format!("{}epochs.csv", prefix));
        let mut epochs = CsvWriter::<EpochRecord>::create(&epochs_path)?;
        let mut agents = AgentCsvDir::new(&dir, prefix.as_str());
        let lexicons = LexiconDumper::new(&dir, prefix.as_str());
        let summary = self.run(&mut epochs, &mut agents, Some(&lexicons))?;

        let summary_path: PathBuf = dir.join(format!("{}summary.json", prefix));
        write_summary(&summary, &summary_path)?;
        tracing::info!(path = %summary_path.display(), "summary written");
        Ok(summary)
    }

    fn dump_agents(&self, epoch: u64, sink: &mut dyn AgentSink) -> Result<(), SimError> {
        let timestamp = now_ms();
        let records: Vec<_> = self
            .population
            .agents()
            .map(|(_, agent)| agent.to_record(epoch, timestamp))
            .collect();
        sink.record_agents(epoch, &records)?;
        Ok(())
    }
}
