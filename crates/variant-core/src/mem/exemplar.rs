//! Exemplars
//!
//! A stored token: variant tag, who said it, how close they were, and where it
//! sits in phonetic space. Also the scoring and noise tools shared by every
//! lexicon.

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use variant_events::{Gender, Variant};

use super::perception::{PerceptionKind, SimilarityKind};

/// Exemplar section of the simulation config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExemplarConfig {
    /// Dimensions of the phonetic feature space
    pub phonetic_dims: usize,
    /// Weight of the phonetic activation in exemplar scores
    pub alpha: f64,
    /// Weight of speaker status in social scores
    pub beta: f64,
    /// Weight of social closeness in social scores
    pub gamma: f64,
    /// Distance beyond which activation stays at its floor
    pub delta_threshold: f64,
    /// Percepts less similar than this to both categories are discarded
    pub min_similarity: f64,
    /// Standard deviation of production noise
    pub noise_factor: f64,
    /// Noise beyond this magnitude is dropped to zero
    pub noise_max: f64,
    /// Exemplars produced per speaker per listener
    pub utterance_size: usize,
    pub perception: PerceptionKind,
    pub similarity: SimilarityKind,
    /// Neighbourhood radius for the epsilon similarity kernel
    pub epsilon: f64,
}

impl Default for ExemplarConfig {
    fn default() -> Self {
        Self {
            phonetic_dims: 5,
            alpha: 1.0,
            beta: 1.0,
            gamma: 1.0,
            delta_threshold: 13.0,
            min_similarity: 0.001,
            noise_factor: 5.0,
            noise_max: 10.0,
            utterance_size: 5,
            perception: PerceptionKind::Magnet,
            similarity: SimilarityKind::Global,
            epsilon: 0.0,
        }
    }
}

/// Immutable exemplar value.
#[derive(Debug, Clone, PartialEq)]
pub struct Exemplar {
    variant: Variant,
    speaker_status: f64,
    speaker_gender: Gender,
    closeness: f64,
    features: Vec<f64>,
    social_score: f64,
}

impl Exemplar {
    pub fn new(
        variant: Variant,
        speaker_status: f64,
        speaker_gender: Gender,
        closeness: f64,
        features: Vec<f64>,
        social_score: f64,
    ) -> Self {
        Self {
            variant,
            speaker_status,
            speaker_gender,
            closeness,
            features,
            social_score,
        }
    }

    /// A prototype: no speaker context, only a category and a location.
    pub fn prototype(variant: Variant, features: Vec<f64>) -> Self {
        Self::new(variant, 0.0, Gender::Female, 0.0, features, 0.0)
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn speaker_status(&self) -> f64 {
        self.speaker_status
    }

    pub fn speaker_gender(&self) -> Gender {
        self.speaker_gender
    }

    pub fn closeness(&self) -> f64 {
        self.closeness
    }

    pub fn features(&self) -> &[f64] {
        &self.features
    }

    pub fn dims(&self) -> usize {
        self.features.len()
    }

    pub fn social_score(&self) -> f64 {
        self.social_score
    }

    /// Same speaker context under a new tag, location and closeness.
    pub fn perceived_as(
        &self,
        variant: Variant,
        features: Vec<f64>,
        closeness: f64,
        tools: &ExemplarTools,
    ) -> Self {
        Self {
            variant,
            speaker_status: self.speaker_status,
            speaker_gender: self.speaker_gender,
            closeness,
            social_score: tools.social_score(self.speaker_status, closeness),
            features,
        }
    }
}

/// Euclidean distance over the shared dimensions.
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// `(wa·a + wb·b) / (wa + wb)`, coordinate-wise.
pub fn weighted_mean(a: &[f64], b: &[f64], wa: f64, wb: f64) -> Vec<f64> {
    let total = wa + wb;
    a.iter()
        .zip(b)
        .map(|(x, y)| (wa * x + wb * y) / total)
        .collect()
}

/// Weights and thresholds for activation, social and exemplar scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExemplarTools {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub delta_threshold: f64,
    floor: f64,
}

impl ExemplarTools {
    pub fn new(alpha: f64, beta: f64, gamma: f64, delta_threshold: f64) -> Self {
        Self {
            alpha,
            beta,
            gamma,
            delta_threshold,
            floor: (-delta_threshold).exp(),
        }
    }

    pub fn from_config(config: &ExemplarConfig) -> Self {
        Self::new(config.alpha, config.beta, config.gamma, config.delta_threshold)
    }

    /// `exp(-d)`, saturating at `exp(-θ)` beyond the threshold.
    pub fn activation(&self, distance: f64) -> f64 {
        if distance > self.delta_threshold {
            self.floor
        } else {
            (-distance).exp()
        }
    }

    pub fn social_score(&self, status: f64, closeness: f64) -> f64 {
        self.beta * status + self.gamma * closeness
    }

    /// Normalized blend of phonetic activation toward `centroid` and the
    /// exemplar's stored social score. From `θ` on the phonetic term is the
    /// unweighted floor, not `α·exp(-θ)`.
    pub fn score(&self, exemplar: &Exemplar, centroid: &[f64]) -> f64 {
        let d = euclidean_distance(exemplar.features(), centroid);
        let phonetic = if d < self.delta_threshold {
            self.alpha * (-d).exp()
        } else {
            self.floor
        };
        (phonetic + exemplar.social_score()) / (self.alpha + self.beta + self.gamma)
    }
}

/// Bounded Gaussian production noise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseModel {
    pub factor: f64,
    pub max: f64,
}

impl NoiseModel {
    pub fn new(factor: f64, max: f64) -> Self {
        Self { factor, max }
    }

    pub fn from_config(config: &ExemplarConfig) -> Self {
        Self::new(config.noise_factor, config.noise_max)
    }

    /// `N(0,1)·factor`, or 0 when that exceeds `max` in magnitude.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let g: f64 = rng.sample(StandardNormal);
        let n = g * self.factor;
        if n.abs() > self.max {
            0.0
        } else {
            n
        }
    }

    /// A noisy production of `exemplar` by a speaker with the given traits.
    /// Closeness and social score are left at 0 for the listener to fill in.
    pub fn noisy_copy<R: Rng + ?Sized>(
        &self,
        exemplar: &Exemplar,
        speaker_status: f64,
        speaker_gender: Gender,
        rng: &mut R,
    ) -> Exemplar {
        let features = exemplar
            .features()
            .iter()
            .map(|x| x + self.sample(rng))
            .collect();
        Exemplar::new(
            exemplar.variant(),
            speaker_status,
            speaker_gender,
            0.0,
            features,
            0.0,
        )
    }
}
