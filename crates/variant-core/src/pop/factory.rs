//! Agent Factory
//!
//! Creates the initial population (with generated lexicons) and the newborns
//! that replace agents reaching the end of their lifespan.

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use variant_events::{Gender, Variant};

use crate::mem::csv::read_exemplars_file;
use crate::mem::{Exemplar, ExemplarConfig, ExemplarTools, Lexicon, NoiseModel};
use crate::net::SelectionPolicy;

use super::agent::Agent;
use super::AgentError;

/// Population section of the simulation config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Speakers each listener hears per epoch
    pub teachers: usize,
    /// Speaker selection policy
    pub interaction: SelectionPolicy,
    /// Agents are replaced once they reach this age
    pub max_lifespan: u32,
    pub female_probability: f64,
    pub status_min: f64,
    pub status_max: f64,
    /// Status assigned to star agents
    pub status_hyp: f64,
    pub lexicon_capacity: usize,
    pub initial_lexicon_size: usize,
    /// Share of A among generated initial exemplars
    pub initial_ratio_a: f64,
    /// Fixed starting age; drawn from `1..max_lifespan` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_age: Option<u32>,
    /// Number of star agents placed at random nodes
    pub stars: usize,
    /// Read agents from this CSV instead of generating them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agents_file: Option<PathBuf>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            teachers: 40,
            interaction: SelectionPolicy::Regular,
            max_lifespan: 5,
            female_probability: 0.5,
            status_min: 0.01,
            status_max: 0.25,
            status_hyp: 1.0,
            lexicon_capacity: 100,
            initial_lexicon_size: 100,
            initial_ratio_a: 0.5,
            initial_age: None,
            stars: 0,
            agents_file: None,
        }
    }
}

/// Category prototypes, inline or from an exemplar CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrototypeConfig {
    pub a: Vec<f64>,
    pub b: Vec<f64>,
    /// Exemplar CSV holding exactly one A and one B row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for PrototypeConfig {
    fn default() -> Self {
        Self {
            a: vec![20.0; 5],
            b: vec![30.0; 5],
            file: None,
        }
    }
}

/// Resolves the A and B prototypes.
pub fn load_prototypes(
    config: &PrototypeConfig,
    exemplar: &ExemplarConfig,
) -> Result<[Exemplar; 2], AgentError> {
    let dims = exemplar.phonetic_dims;
    let (a, b) = match &config.file {
        Some(path) => {
            tracing::info!(path = %path.display(), "reading prototypes");
            let tools = ExemplarTools::from_config(exemplar);
            let rows = read_exemplars_file(path, dims, &tools)?;
            if rows.len() != 2 {
                return Err(AgentError::Prototypes(format!(
                    "expected 2 prototype rows, found {}",
                    rows.len()
                )));
            }
            let find = |v: Variant| {
                rows.iter()
                    .find(|e| e.variant() == v)
                    .cloned()
                    .ok_or_else(|| AgentError::Prototypes(format!("no prototype for {}", v)))
            };
            (find(Variant::A)?, find(Variant::B)?)
        }
        None => (
            Exemplar::prototype(Variant::A, config.a.clone()),
            Exemplar::prototype(Variant::B, config.b.clone()),
        ),
    };
    for p in [&a, &b] {
        if p.dims() != dims {
            return Err(AgentError::Prototypes(format!(
                "prototype {} has {} dimensions, expected {}",
                p.variant(),
                p.dims(),
                dims
            )));
        }
    }
    Ok([a, b])
}

/// Hands out agent ids and builds agents from the configured distributions.
#[derive(Debug, Clone)]
pub struct AgentFactory {
    population: PopulationConfig,
    exemplar: ExemplarConfig,
    prototypes: [Exemplar; 2],
    noise: NoiseModel,
    next_id: u64,
}

impl AgentFactory {
    pub fn new(population: PopulationConfig, exemplar: ExemplarConfig, prototypes: [Exemplar; 2]) -> Self {
        let noise = NoiseModel::from_config(&exemplar);
        Self {
            population,
            exemplar,
            prototypes,
            noise,
            next_id: 1,
        }
    }

    pub fn population(&self) -> &PopulationConfig {
        &self.population
    }

    /// Id the next created agent will get.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// An agent with explicit traits; later ids continue after `id`.
    #[allow(clippy::too_many_arguments)]
    pub fn init_agent(
        &mut self,
        id: u64,
        node: usize,
        age: u32,
        gender: Gender,
        status: f64,
        star: bool,
        lexicon: Lexicon,
    ) -> Agent {
        self.next_id = self.next_id.max(id + 1);
        Agent::new(id, node, age, gender, status, star, lexicon)
    }

    /// A newborn at `node`: age 0, fresh status and gender, empty lexicon.
    pub fn newborn<R: Rng + ?Sized>(&mut self, node: usize, star: bool, lexicon: Lexicon, rng: &mut R) -> Agent {
        let gender = self.draw_gender(rng);
        let status = self.draw_status(star, rng);
        let id = self.take_id();
        Agent::new(id, node, 0, gender, status, star, lexicon)
    }

    /// A replacement for `old`, keeping its node, star flag and capacity.
    pub fn replace<R: Rng + ?Sized>(&mut self, old: &Agent, rng: &mut R) -> Agent {
        self.newborn(old.node(), old.is_star(), old.lexicon().empty_like(), rng)
    }

    /// `size` noisy copies of the prototypes, `A` with probability `ratio_a`.
    pub fn generate_lexicon<R: Rng + ?Sized>(
        &self,
        capacity: usize,
        size: usize,
        ratio_a: f64,
        rng: &mut R,
    ) -> Result<Lexicon, AgentError> {
        if size > capacity {
            return Err(AgentError::LexiconOverflow { size, capacity });
        }
        if !(0.0..=1.0).contains(&ratio_a) {
            return Err(AgentError::InitialRatio(ratio_a));
        }
        let mut lexicon = Lexicon::from_config(capacity, &self.exemplar)?;
        let [a, b] = &self.prototypes;
        for _ in 0..size {
            let proto = if rng.gen::<f64>() < ratio_a { a } else { b };
            let copy = self
                .noise
                .noisy_copy(proto, proto.speaker_status(), proto.speaker_gender(), rng);
            lexicon.add(copy)?;
        }
        Ok(lexicon)
    }

    /// One agent per node with generated lexicons.
    pub fn populate<R: Rng + ?Sized>(&mut self, nodes: usize, rng: &mut R) -> Result<Vec<Agent>, AgentError> {
        let stars = self.population.stars.min(nodes);
        let mut is_star = vec![false; nodes];
        for node in index::sample(rng, nodes, stars) {
            is_star[node] = true;
        }

        let capacity = self.population.lexicon_capacity;
        let size = self.population.initial_lexicon_size;
        let ratio_a = self.population.initial_ratio_a;

        let mut agents = Vec::with_capacity(nodes);
        for (node, star) in is_star.into_iter().enumerate() {
            let lexicon = self.generate_lexicon(capacity, size, ratio_a, rng)?;
            let age = match self.population.initial_age {
                Some(age) => age,
                None => rng.gen_range(1..self.population.max_lifespan.max(2)),
            };
            let gender = self.draw_gender(rng);
            let status = self.draw_status(star, rng);
            let id = self.take_id();
            agents.push(Agent::new(id, node, age, gender, status, star, lexicon));
        }
        tracing::info!(agents = agents.len(), stars, "population generated");
        Ok(agents)
    }

    fn draw_gender<R: Rng + ?Sized>(&self, rng: &mut R) -> Gender {
        if rng.gen::<f64>() < self.population.female_probability {
            Gender::Female
        } else {
            Gender::Male
        }
    }

    fn draw_status<R: Rng + ?Sized>(&self, star: bool, rng: &mut R) -> f64 {
        if star {
            self.population.status_hyp
        } else {
            let (lo, hi) = (self.population.status_min, self.population.status_max);
            if hi > lo {
                rng.gen_range(lo..hi)
            } else {
                lo
            }
        }
    }
}
