//! Interaction Engine
//!
//! One epoch runs in three passes over the population on a bounded worker
//! pool:
//!
//! 0. every agent refreshes its lexicon caches (exclusive, per agent);
//! 1. every listener collects productions from its selected speakers
//!    (shared read access to the whole network);
//! 2. every listener perceives its own batch (exclusive, per listener).
//!
//! Pass 1 completes for all listeners before pass 2 starts, so nobody hears
//! an exemplar that was learned during the same epoch. Each task draws from
//! its own random stream; a failing task is logged and its listener's
//! remaining contribution is dropped. Productions are counted only once
//! perceived, so speaker, listener and epoch totals always agree.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use variant_events::{EpochRecord, Variant};

use crate::mem::{Exemplar, NoiseModel};
use crate::net::SelectionPolicy;

use super::agent::Agent;
use super::rng::{Phase, SeedSource};
use super::{InteractionError, Population};

/// Everything one listener hears in an epoch, tagged by speaker node.
#[derive(Debug, Clone)]
pub struct Productions {
    pub listener: usize,
    pub heard: Vec<(usize, Exemplar)>,
}

/// What one listener actually perceived in pass 2.
#[derive(Debug)]
struct Perceived {
    productions_a: u64,
    productions_b: u64,
    /// Speaker node of every perceived exemplar
    speakers: Vec<usize>,
    error: Option<InteractionError>,
}

/// Result of one epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochOutcome {
    pub record: EpochRecord,
    /// Listeners whose collection or perception failed
    pub faults: usize,
}

impl EpochOutcome {
    /// Share of A among this epoch's productions.
    pub fn ratio_a(&self) -> Option<f64> {
        self.record.ratio_a()
    }
}

pub struct Interaction {
    pool: ThreadPool,
    seeds: SeedSource,
    policy: SelectionPolicy,
    teachers: usize,
    utterance_size: usize,
    noise: NoiseModel,
    last_epoch: Option<u64>,
}

impl Interaction {
    /// `threads = None` uses one worker per available core.
    pub fn new(
        seeds: SeedSource,
        policy: SelectionPolicy,
        teachers: usize,
        utterance_size: usize,
        noise: NoiseModel,
        threads: Option<usize>,
    ) -> Result<Self, InteractionError> {
        let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("interaction-{}", i));
        if let Some(n) = threads {
            builder = builder.num_threads(n);
        }
        let pool = builder.build()?;
        tracing::debug!(
            threads = pool.current_num_threads(),
            ?policy,
            teachers,
            "interaction pool ready"
        );
        Ok(Self {
            pool,
            seeds,
            policy,
            teachers,
            utterance_size,
            noise,
            last_epoch: None,
        })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn last_epoch(&self) -> Option<u64> {
        self.last_epoch
    }

    /// Runs epoch `epoch`. Epoch indices must strictly increase.
    pub fn run_epoch(
        &mut self,
        population: &mut Population,
        epoch: u64,
        timestamp_ms: u64,
    ) -> Result<EpochOutcome, InteractionError> {
        if let Some(last) = self.last_epoch {
            if epoch <= last {
                return Err(InteractionError::EpochReplayed { epoch, last });
            }
        }
        self.last_epoch = Some(epoch);

        let n = population.size();

        // Pass 0: make lexicon caches readable without locking.
        {
            let (_, slots) = population.split_mut();
            self.pool.install(|| {
                slots.par_iter_mut().flatten().for_each(Agent::refresh_caches);
            });
        }

        // Pass 1: collect productions.
        let collected: Vec<Result<Productions, InteractionError>> = {
            let net: &Population = population;
            self.pool.install(|| {
                (0..n)
                    .into_par_iter()
                    .filter(|&listener| net.agent(listener).is_some())
                    .map(|listener| self.collect(net, listener, epoch))
                    .collect()
            })
        };

        let mut faults = 0;
        let mut batches: Vec<Option<Productions>> = (0..n).map(|_| None).collect();
        for result in collected {
            match result {
                Ok(p) => {
                    let listener = p.listener;
                    batches[listener] = Some(p);
                }
                Err(e) => {
                    faults += 1;
                    tracing::warn!(epoch, error = %e, "dropping listener contribution");
                }
            }
        }

        // Pass 2: every listener perceives its own batch.
        let perceived: Vec<Perceived> = {
            let (topology, slots) = population.split_mut();
            self.pool.install(|| {
                slots
                    .par_iter_mut()
                    .zip(batches.into_par_iter())
                    .filter_map(|(slot, batch)| Some((slot.as_mut()?, batch?)))
                    .map(|(agent, batch)| {
                        let mut out = Perceived {
                            productions_a: 0,
                            productions_b: 0,
                            speakers: Vec::with_capacity(batch.heard.len()),
                            error: None,
                        };
                        for (speaker, exemplar) in &batch.heard {
                            let closeness = topology.closeness(batch.listener, *speaker);
                            if let Err(e) = agent.listen(exemplar, closeness) {
                                out.error = Some(e.into());
                                break;
                            }
                            if exemplar.variant() == Variant::A {
                                out.productions_a += 1;
                            } else {
                                out.productions_b += 1;
                            }
                            out.speakers.push(*speaker);
                        }
                        out
                    })
                    .collect()
            })
        };

        let (mut productions_a, mut productions_b) = (0u64, 0u64);
        let mut produced = vec![0u64; n];
        for p in perceived {
            productions_a += p.productions_a;
            productions_b += p.productions_b;
            for speaker in p.speakers {
                produced[speaker] += 1;
            }
            if let Some(e) = p.error {
                faults += 1;
                tracing::warn!(epoch, error = %e, "perception failed for listener");
            }
        }
        for (node, count) in produced.into_iter().enumerate().filter(|&(_, c)| c > 0) {
            if let Some(agent) = population.agent_mut(node) {
                agent.record_produced(count);
            }
        }

        let record = EpochRecord {
            timestamp_ms,
            epoch,
            productions_a,
            productions_b,
        };
        tracing::debug!(
            epoch,
            productions_a,
            productions_b,
            faults,
            "epoch interactions complete"
        );
        Ok(EpochOutcome { record, faults })
    }

    fn collect(
        &self,
        net: &Population,
        listener: usize,
        epoch: u64,
    ) -> Result<Productions, InteractionError> {
        let mut rng = self.seeds.stream(Phase::Collect, epoch, listener);
        let set = net.select_speakers(listener, self.policy, self.teachers, &mut rng)?;
        let speakers = net.resolve(&set)?;

        let mut heard = Vec::with_capacity(set.len() * self.utterance_size);
        for (&node, speaker) in set.nodes().iter().zip(speakers) {
            for exemplar in speaker.speak(self.utterance_size, &self.noise, &mut rng)? {
                heard.push((node, exemplar));
            }
        }
        Ok(Productions { listener, heard })
    }
}
