//! Random Streams
//!
//! Every parallel task gets its own generator derived from the run seed and
//! the task's coordinates, so results do not depend on scheduling.

use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Which part of the run a stream belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Setup,
    Collect,
    Aging,
}

impl Phase {
    fn salt(self) -> u64 {
        match self {
            Phase::Setup => 1,
            Phase::Collect => 2,
            Phase::Aging => 3,
        }
    }
}

/// Derives independent `SmallRng` streams from one base seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSource {
    seed: u64,
}

impl SeedSource {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// A fresh seed from the operating system.
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The stream for `(phase, epoch, node)`.
    pub fn stream(&self, phase: Phase, epoch: u64, node: usize) -> SmallRng {
        let mut h = splitmix64(self.seed ^ splitmix64(phase.salt()));
        h = splitmix64(h ^ epoch);
        h = splitmix64(h ^ node as u64);
        SmallRng::seed_from_u64(h)
    }

    /// The single stream used while building the network and population.
    pub fn setup(&self) -> SmallRng {
        self.stream(Phase::Setup, 0, 0)
    }
}

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
