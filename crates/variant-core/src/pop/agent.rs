//! Agents
//!
//! A speaker/listener with its own lexicon. The interaction engine only ever
//! calls [`Agent::speak`] and [`Agent::listen`].

use rand::Rng;
use variant_events::{AgentRecord, Gender, Variant};

use crate::mem::{Exemplar, Lexicon, LexiconError, NoiseModel};
use crate::net::Resident;

/// Exemplar traffic through one agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentCounters {
    pub received: u64,
    pub discarded: u64,
    pub produced: u64,
}

#[derive(Debug, Clone)]
pub struct Agent {
    id: u64,
    node: usize,
    age: u32,
    gender: Gender,
    status: f64,
    star: bool,
    lexicon: Lexicon,
    counters: AgentCounters,
}

impl Agent {
    pub fn new(
        id: u64,
        node: usize,
        age: u32,
        gender: Gender,
        status: f64,
        star: bool,
        lexicon: Lexicon,
    ) -> Self {
        Self {
            id,
            node,
            age,
            gender,
            status,
            star,
            lexicon,
            counters: AgentCounters::default(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn node(&self) -> usize {
        self.node
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn is_star(&self) -> bool {
        self.star
    }

    pub fn counters(&self) -> AgentCounters {
        self.counters
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn lexicon_mut(&mut self) -> &mut Lexicon {
        &mut self.lexicon
    }

    /// `utterance_size` noisy productions of score-weighted exemplars.
    pub fn speak<R: Rng + ?Sized>(
        &self,
        utterance_size: usize,
        noise: &NoiseModel,
        rng: &mut R,
    ) -> Result<Vec<Exemplar>, LexiconError> {
        (0..utterance_size)
            .map(|_| {
                let source = self.lexicon.good_exemplar(rng)?;
                Ok(noise.noisy_copy(source, self.status, self.gender, rng))
            })
            .collect()
    }

    /// Perceives `exemplar` heard at `closeness` and stores the percept
    /// unless it came out undefined. Returns the percept's variant; nothing
    /// is counted when storing fails.
    pub fn listen(&mut self, exemplar: &Exemplar, closeness: f64) -> Result<Variant, LexiconError> {
        let percept = self.lexicon.percept(exemplar, closeness);
        let variant = percept.variant();
        if variant.is_defined() {
            self.lexicon.add(percept)?;
        } else {
            self.counters.discarded += 1;
        }
        self.counters.received += 1;
        Ok(variant)
    }

    pub fn record_produced(&mut self, count: u64) {
        self.counters.produced += count;
    }

    pub fn refresh_caches(&mut self) {
        self.lexicon.refresh_caches();
    }

    pub fn to_record(&self, epoch: u64, timestamp_ms: u64) -> AgentRecord {
        AgentRecord {
            timestamp_ms,
            epoch,
            node: self.node,
            agent_id: self.id,
            age: self.age,
            gender: self.gender,
            status: self.status,
            ratio_a: self.lexicon.variant_a_ratio(),
            received: self.counters.received,
            discarded: self.counters.discarded,
            produced: self.counters.produced,
        }
    }
}

impl Resident for Agent {
    fn age(&self) -> u32 {
        self.age
    }

    fn status(&self) -> f64 {
        self.status
    }

    fn grow_older(&mut self) -> u32 {
        self.age += 1;
        self.age
    }
}
