//! Speaker Selection
//!
//! Policies that pick the teachers a listener hears during one epoch.
//! Every policy returns exactly the requested number of nodes, never the
//! listener itself and never a node whose agent is a newborn.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::network::{Network, Resident};
use super::NetworkError;

/// How speakers are sampled for a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Uniform, distinct when the population allows it
    #[default]
    Regular,
    /// Accepted with probability equal to the speaker's status
    ByStatus,
    /// Accepted with probability equal to closeness to the listener
    ByDistance,
    /// Closest nodes first, in the fixed closeness ranking
    ByDistanceDet,
}

/// Node ids drawn for one listener, stamped with the network's
/// modification counter at draw time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerSet {
    listener: usize,
    nodes: Vec<usize>,
    stamp: u64,
}

impl SpeakerSet {
    pub fn listener(&self) -> usize {
        self.listener
    }

    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    pub fn stamp(&self) -> u64 {
        self.stamp
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<A: Resident> Network<A> {
    /// Draws `count` speaker nodes for `listener` according to `policy`.
    pub fn select_speakers<R: Rng + ?Sized>(
        &self,
        listener: usize,
        policy: SelectionPolicy,
        count: usize,
        rng: &mut R,
    ) -> Result<SpeakerSet, NetworkError> {
        let size = self.size();
        if listener >= size {
            return Err(NetworkError::NodeOutOfRange {
                node: listener,
                size,
            });
        }

        let nodes = if count == 0 {
            Vec::new()
        } else {
            match policy {
                SelectionPolicy::Regular => self.select_regular(listener, count, rng)?,
                SelectionPolicy::ByStatus => self.select_weighted(listener, count, rng, |net, node| {
                    net.agent(node).map_or(0.0, Resident::status)
                })?,
                SelectionPolicy::ByDistance => self.select_weighted(listener, count, rng, |net, node| {
                    net.closeness(listener, node)
                })?,
                SelectionPolicy::ByDistanceDet => self.select_closest(listener, count)?,
            }
        };

        Ok(SpeakerSet {
            listener,
            nodes,
            stamp: self.modifications(),
        })
    }

    fn select_regular<R: Rng + ?Sized>(
        &self,
        listener: usize,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<usize>, NetworkError> {
        let n = self.size();
        let eligible = (0..n).filter(|&x| self.is_eligible_speaker(listener, x)).count();
        if eligible == 0 {
            return Err(NetworkError::NoEligibleSpeakers { listener });
        }

        let mut nodes = Vec::with_capacity(count);
        if n > count && eligible >= count {
            let mut found = vec![false; n];
            while nodes.len() < count {
                let nx = rng.gen_range(0..n);
                if !found[nx] && self.is_eligible_speaker(listener, nx) {
                    found[nx] = true;
                    nodes.push(nx);
                }
            }
        } else {
            // Not enough distinct speakers: scan cyclically, repeating nodes.
            let mut nx = rng.gen_range(0..n);
            while nodes.len() < count {
                if self.is_eligible_speaker(listener, nx) {
                    nodes.push(nx);
                }
                nx = (nx + 1) % n;
            }
        }
        Ok(nodes)
    }

    /// Rejection sampling: a uniformly drawn eligible node is accepted with
    /// probability `weight` (never at `<= 0`, always at `>= 1`). Duplicates
    /// are not rejected.
    fn select_weighted<R, W>(
        &self,
        listener: usize,
        count: usize,
        rng: &mut R,
        weight: W,
    ) -> Result<Vec<usize>, NetworkError>
    where
        R: Rng + ?Sized,
        W: Fn(&Self, usize) -> f64,
    {
        let n = self.size();
        let any_positive = (0..n)
            .any(|x| self.is_eligible_speaker(listener, x) && weight(self, x) > 0.0);
        if !any_positive {
            return Err(NetworkError::NoEligibleSpeakers { listener });
        }

        let mut nodes = Vec::with_capacity(count);
        while nodes.len() < count {
            let nx = rng.gen_range(0..n);
            if !self.is_eligible_speaker(listener, nx) {
                continue;
            }
            let w = weight(self, nx);
            if w <= 0.0 {
                continue;
            }
            if w >= 1.0 || rng.gen::<f64>() < w {
                nodes.push(nx);
            }
        }
        Ok(nodes)
    }

    fn select_closest(&self, listener: usize, count: usize) -> Result<Vec<usize>, NetworkError> {
        let eligible: Vec<usize> = self
            .topology()
            .ranking(listener)
            .iter()
            .copied()
            .filter(|&x| self.is_eligible_speaker(listener, x))
            .collect();
        if eligible.is_empty() {
            return Err(NetworkError::NoEligibleSpeakers { listener });
        }
        Ok(eligible.iter().copied().cycle().take(count).collect())
    }
}
