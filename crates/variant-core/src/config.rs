//! Configuration loading for the simulation.
//!
//! All run settings are loaded from a TOML file. Every section and field is
//! optional and falls back to its default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::mem::{ExemplarConfig, SimilarityKind};
use crate::net::{NetworkConfig, NetworkKind};
use crate::pop::{PopulationConfig, PrototypeConfig};

/// Complete simulation configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimConfig {
    /// Run length and reproducibility
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Output location and dump schedule
    #[serde(default)]
    pub output: OutputConfig,
    /// Topology generation
    #[serde(default)]
    pub network: NetworkConfig,
    /// Exemplar scoring, noise and perception
    #[serde(default)]
    pub exemplar: ExemplarConfig,
    /// Agent traits, lifespans and speaker selection
    #[serde(default)]
    pub population: PopulationConfig,
    /// Category prototypes used to seed lexicons
    #[serde(default)]
    pub prototypes: PrototypeConfig,
}

impl SimConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks value ranges and cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        check(sim.epochs >= 1, "simulation.epochs", "must be at least 1")?;
        check(sim.threads != Some(0), "simulation.threads", "must be positive")?;

        let net = &self.network;
        if net.edges_file.is_none() {
            check(
                net.cols >= 1 && net.rows >= 1,
                "network.cols",
                "grid needs at least one column and row",
            )?;
            check(
                net.kind != NetworkKind::Undefined,
                "network.kind",
                "undefined networks need an edges_file",
            )?;
            if net.kind == NetworkKind::Parochial {
                check(net.parishes >= 2, "network.parishes", "must be at least 2")?;
            }
        }
        check(
            probability(net.rewire_probability),
            "network.rewire_probability",
            "must be in [0, 1]",
        )?;
        check(net.max_rewire_attempts >= 1, "network.max_rewire_attempts", "must be at least 1")?;

        let ex = &self.exemplar;
        check(ex.phonetic_dims >= 1, "exemplar.phonetic_dims", "must be at least 1")?;
        check(
            ex.alpha >= 0.0 && ex.beta >= 0.0 && ex.gamma >= 0.0,
            "exemplar.alpha",
            "score weights must be non-negative",
        )?;
        check(
            ex.alpha + ex.beta + ex.gamma > 0.0,
            "exemplar.alpha",
            "score weights must not all be zero",
        )?;
        check(ex.delta_threshold >= 0.0, "exemplar.delta_threshold", "must be non-negative")?;
        check(probability(ex.min_similarity), "exemplar.min_similarity", "must be in [0, 1]")?;
        check(ex.noise_factor >= 0.0, "exemplar.noise_factor", "must be non-negative")?;
        check(ex.noise_max >= 0.0, "exemplar.noise_max", "must be non-negative")?;
        check(ex.utterance_size >= 1, "exemplar.utterance_size", "must be at least 1")?;
        if ex.similarity == SimilarityKind::Epsilon {
            check(ex.epsilon > 0.0, "exemplar.epsilon", "must be positive for the epsilon kernel")?;
        }

        let pop = &self.population;
        check(pop.teachers >= 1, "population.teachers", "must be at least 1")?;
        check(pop.max_lifespan >= 1, "population.max_lifespan", "must be at least 1")?;
        check(
            probability(pop.female_probability),
            "population.female_probability",
            "must be in [0, 1]",
        )?;
        check(
            pop.status_min <= pop.status_max,
            "population.status_min",
            "must not exceed status_max",
        )?;
        check(pop.lexicon_capacity >= 1, "population.lexicon_capacity", "must be at least 1")?;
        check(
            pop.initial_lexicon_size <= pop.lexicon_capacity,
            "population.initial_lexicon_size",
            "must not exceed lexicon_capacity",
        )?;
        check(probability(pop.initial_ratio_a), "population.initial_ratio_a", "must be in [0, 1]")?;
        check(
            pop.initial_age != Some(0),
            "population.initial_age",
            "initial agents must be able to speak",
        )?;

        let proto = &self.prototypes;
        if proto.file.is_none() {
            check(
                proto.a.len() == ex.phonetic_dims,
                "prototypes.a",
                "length must equal exemplar.phonetic_dims",
            )?;
            check(
                proto.b.len() == ex.phonetic_dims,
                "prototypes.b",
                "length must equal exemplar.phonetic_dims",
            )?;
        }
        Ok(())
    }
}

fn probability(p: f64) -> bool {
    (0.0..=1.0).contains(&p)
}

fn check(ok: bool, field: &'static str, reason: &str) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: reason.to_string(),
        })
    }
}

/// Run length and reproducibility settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Maximum number of epochs
    pub epochs: u64,
    /// Stop after this many consecutive epochs in which one variant was
    /// never produced; 0 never stops early
    pub max_wait: u64,
    /// Base seed; drawn from the OS when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Worker threads; one per core when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
    /// Free-form label copied into the summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            epochs: 1000,
            max_wait: 15,
            seed: None,
            threads: None,
            tag: None,
        }
    }
}

/// Output location and snapshot schedule. An interval of 0 disables
/// periodic snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Prepended to every output file name
    pub prefix: String,
    pub dump_agents_interval: u64,
    pub dump_agents_first: bool,
    pub dump_agents_last: bool,
    pub dump_lexicon_interval: u64,
    pub dump_lexicon_first: bool,
    pub dump_lexicon_last: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            prefix: String::new(),
            dump_agents_interval: 10,
            dump_agents_first: true,
            dump_agents_last: true,
            dump_lexicon_interval: 0,
            dump_lexicon_first: false,
            dump_lexicon_last: false,
        }
    }
}

impl OutputConfig {
    pub fn dumps_agents(&self, epoch: u64, last: u64) -> bool {
        scheduled(
            epoch,
            last,
            self.dump_agents_interval,
            self.dump_agents_first,
            self.dump_agents_last,
        )
    }

    pub fn dumps_lexicons(&self, epoch: u64, last: u64) -> bool {
        scheduled(
            epoch,
            last,
            self.dump_lexicon_interval,
            self.dump_lexicon_first,
            self.dump_lexicon_last,
        )
    }
}

fn scheduled(epoch: u64, last: u64, interval: u64, first: bool, at_last: bool) -> bool {
    (first && epoch == 0)
        || (at_last && epoch == last)
        || (interval > 0 && epoch > 0 && epoch % interval == 0)
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
