//! Perception
//!
//! Similarity kernels and the strategies that map a heard exemplar to the
//! percept a listener stores.

use serde::{Deserialize, Serialize};
use variant_events::Variant;

use super::exemplar::{euclidean_distance, weighted_mean, Exemplar, ExemplarConfig, ExemplarTools};
use super::lexicon::Lexicon;

/// Perception strategy as named in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerceptionKind {
    #[default]
    Magnet,
    Linear,
}

/// Similarity kernel as named in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityKind {
    #[default]
    Global,
    Epsilon,
}

/// How similar a stimulus is to one category of a lexicon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimilarityKernel {
    /// Mean activation over all exemplars of the category
    Global,
    /// Share of the category among exemplars within `epsilon`
    Epsilon { epsilon: f64 },
}

impl SimilarityKernel {
    pub fn from_config(config: &ExemplarConfig) -> Self {
        match config.similarity {
            SimilarityKind::Global => SimilarityKernel::Global,
            SimilarityKind::Epsilon => SimilarityKernel::Epsilon {
                epsilon: config.epsilon,
            },
        }
    }

    /// Always in `[0, 1]`; 0 when there is nothing to compare against.
    pub fn similarity<'a, I>(
        &self,
        exemplars: I,
        stimulus: &[f64],
        variant: Variant,
        tools: &ExemplarTools,
    ) -> f64
    where
        I: IntoIterator<Item = &'a Exemplar>,
    {
        match *self {
            SimilarityKernel::Global => {
                let (sum, count) = exemplars
                    .into_iter()
                    .filter(|e| e.variant() == variant)
                    .fold((0.0, 0usize), |(sum, count), e| {
                        let d = euclidean_distance(e.features(), stimulus);
                        (sum + tools.activation(d), count + 1)
                    });
                if count == 0 {
                    0.0
                } else {
                    sum / count as f64
                }
            }
            SimilarityKernel::Epsilon { epsilon } => {
                let (same, total) = exemplars
                    .into_iter()
                    .filter(|e| within_box(e.features(), stimulus, epsilon))
                    .filter(|e| euclidean_distance(e.features(), stimulus) <= epsilon)
                    .fold((0usize, 0usize), |(same, total), e| {
                        (same + usize::from(e.variant() == variant), total + 1)
                    });
                if total == 0 {
                    0.0
                } else {
                    same as f64 / total as f64
                }
            }
        }
    }
}

fn within_box(point: &[f64], center: &[f64], epsilon: f64) -> bool {
    point
        .iter()
        .zip(center)
        .all(|(p, c)| (p - c).abs() <= epsilon)
}

/// How a heard exemplar becomes a percept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Perception {
    /// Pulled toward the centroid of the most similar category; rejected as
    /// undefined when neither category is similar enough
    Magnet { min_similarity: f64 },
    /// Stored as heard
    Linear,
}

impl Perception {
    pub fn from_config(config: &ExemplarConfig) -> Self {
        match config.perception {
            PerceptionKind::Magnet => Perception::Magnet {
                min_similarity: config.min_similarity,
            },
            PerceptionKind::Linear => Perception::Linear,
        }
    }

    /// The percept of `stimulus` heard at `closeness` by the owner of
    /// `lexicon`. Social context is always recomputed from `closeness`.
    pub fn perceive(&self, lexicon: &mut Lexicon, stimulus: &Exemplar, closeness: f64) -> Exemplar {
        let tools = *lexicon.tools();
        let min_similarity = match *self {
            Perception::Linear => {
                return stimulus.perceived_as(
                    stimulus.variant(),
                    stimulus.features().to_vec(),
                    closeness,
                    &tools,
                );
            }
            Perception::Magnet { min_similarity } => min_similarity,
        };

        if lexicon.is_empty() {
            return stimulus.perceived_as(
                stimulus.variant(),
                stimulus.features().to_vec(),
                closeness,
                &tools,
            );
        }

        let sim_a = lexicon.similarity(stimulus.features(), Variant::A);
        let sim_b = lexicon.similarity(stimulus.features(), Variant::B);
        let (winner, sim) = if sim_a > sim_b {
            (Variant::A, sim_a)
        } else {
            (Variant::B, sim_b)
        };

        if sim < min_similarity {
            tracing::trace!(sim_a, sim_b, "percept too dissimilar, undefined");
            return stimulus.perceived_as(
                Variant::Undefined,
                stimulus.features().to_vec(),
                closeness,
                &tools,
            );
        }

        let centroid = lexicon.centroid(winner);
        let features = weighted_mean(centroid, stimulus.features(), sim, 1.0 - sim);
        stimulus.perceived_as(winner, features, closeness, &tools)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use variant_events::Gender;

    fn ex(variant: Variant, features: Vec<f64>) -> Exemplar {
        Exemplar::new(variant, 0.5, Gender::Male, 0.0, features, 0.0)
    }

    fn tools() -> ExemplarTools {
        ExemplarTools::new(1.0, 1.0, 1.0, 13.0)
    }

    #[test]
    fn test_global_similarity_exact_match() {
        let store = vec![ex(Variant::A, vec![0.0, 0.0]), ex(Variant::B, vec![5.0, 5.0])];
        let sim = SimilarityKernel::Global.similarity(&store, &[0.0, 0.0], Variant::A, &tools());
        assert!((sim - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_global_similarity_missing_category() {
        let store = vec![ex(Variant::A, vec![0.0])];
        let sim = SimilarityKernel::Global.similarity(&store, &[0.0], Variant::B, &tools());
        assert_eq!(sim, 0.0);
    }

    #[test]
    fn test_epsilon_similarity_fraction() {
        let store = vec![
            ex(Variant::A, vec![0.0, 0.0]),
            ex(Variant::A, vec![0.5, 0.0]),
            ex(Variant::B, vec![0.0, 0.5]),
            // inside the box, outside the ball
            ex(Variant::B, vec![0.9, 0.9]),
            ex(Variant::B, vec![10.0, 10.0]),
        ];
        let kernel = SimilarityKernel::Epsilon { epsilon: 1.0 };
        let sim_a = kernel.similarity(&store, &[0.0, 0.0], Variant::A, &tools());
        let sim_b = kernel.similarity(&store, &[0.0, 0.0], Variant::B, &tools());
        assert!((sim_a - 2.0 / 3.0).abs() < 1e-12);
        assert!((sim_b - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_epsilon_similarity_empty_ball() {
        let store = vec![ex(Variant::A, vec![5.0])];
        let kernel = SimilarityKernel::Epsilon { epsilon: 0.1 };
        assert_eq!(kernel.similarity(&store, &[0.0], Variant::A, &tools()), 0.0);
    }
}
