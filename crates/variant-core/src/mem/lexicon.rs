//! Lexicon
//!
//! Fixed-capacity exemplar memory partitioned into the two variants.
//!
//! Each variant has a version counter bumped on every insertion or eviction
//! touching it. Centroids are cached per variant against that version and the
//! per-slot score array against the pair of versions, so caches are rebuilt
//! only after the memory actually changed.

use rand::Rng;
use variant_events::Variant;

use super::exemplar::{Exemplar, ExemplarConfig, ExemplarTools};
use super::memo::Memo;
use super::perception::{Perception, SimilarityKernel};
use super::ring::RingBuffer;
use super::LexiconError;

#[derive(Debug, Clone)]
pub struct Lexicon {
    ring: RingBuffer<Exemplar>,
    dims: usize,
    tools: ExemplarTools,
    kernel: SimilarityKernel,
    perception: Perception,
    versions: [u64; 2],
    counts: [usize; 2],
    centroids: [Memo<u64, Vec<f64>>; 2],
    scores: Memo<(u64, u64), Vec<f64>>,
}

impl Lexicon {
    pub fn new(
        capacity: usize,
        dims: usize,
        tools: ExemplarTools,
        kernel: SimilarityKernel,
        perception: Perception,
    ) -> Result<Self, LexiconError> {
        if capacity == 0 {
            return Err(LexiconError::ZeroCapacity);
        }
        Ok(Self {
            ring: RingBuffer::new(capacity),
            dims,
            tools,
            kernel,
            perception,
            versions: [0; 2],
            counts: [0; 2],
            centroids: [Memo::new(Vec::new()), Memo::new(Vec::new())],
            scores: Memo::new(Vec::new()),
        })
    }

    pub fn from_config(capacity: usize, config: &ExemplarConfig) -> Result<Self, LexiconError> {
        Self::new(
            capacity,
            config.phonetic_dims,
            ExemplarTools::from_config(config),
            SimilarityKernel::from_config(config),
            Perception::from_config(config),
        )
    }

    /// An empty lexicon with the same capacity and settings.
    pub fn empty_like(&self) -> Self {
        Self {
            ring: RingBuffer::new(self.ring.capacity()),
            versions: [0; 2],
            counts: [0; 2],
            centroids: [Memo::new(Vec::new()), Memo::new(Vec::new())],
            scores: Memo::new(Vec::new()),
            ..*self
        }
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn tools(&self) -> &ExemplarTools {
        &self.tools
    }

    pub fn perception(&self) -> Perception {
        self.perception
    }

    pub fn kernel(&self) -> SimilarityKernel {
        self.kernel
    }

    /// Stored exemplars of `variant`.
    pub fn count(&self, variant: Variant) -> usize {
        variant.index().map_or(0, |i| self.counts[i])
    }

    pub fn version(&self, variant: Variant) -> u64 {
        variant.index().map_or(0, |i| self.versions[i])
    }

    /// Exemplars oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Exemplar> + '_ {
        self.ring.iter()
    }

    /// Stores `exemplar`, overwriting the oldest one when full. Returns the
    /// evicted exemplar.
    ///
    /// Bumps the version of the stored variant and, on eviction, also the
    /// version of the evicted exemplar's variant: its centroid and scores
    /// changed as well, so caches keyed on that version must not survive.
    pub fn add(&mut self, exemplar: Exemplar) -> Result<Option<Exemplar>, LexiconError> {
        let idx = exemplar
            .variant()
            .index()
            .ok_or(LexiconError::UnstorableVariant(exemplar.variant()))?;
        if exemplar.dims() != self.dims {
            return Err(LexiconError::DimensionMismatch {
                expected: self.dims,
                actual: exemplar.dims(),
            });
        }

        let evicted = self.ring.push(exemplar);
        self.versions[idx] += 1;
        self.counts[idx] += 1;
        if let Some(old) = &evicted {
            if let Some(old_idx) = old.variant().index() {
                self.versions[old_idx] += 1;
                self.counts[old_idx] -= 1;
            }
        }
        Ok(evicted)
    }

    /// Similarity of `stimulus` to the stored exemplars of `variant`.
    pub fn similarity(&self, stimulus: &[f64], variant: Variant) -> f64 {
        self.kernel
            .similarity(self.ring.as_slice(), stimulus, variant, &self.tools)
    }

    /// Mean location of `variant`; zeros when it has no exemplars.
    pub fn centroid(&mut self, variant: Variant) -> &[f64] {
        let Some(idx) = variant.index() else {
            return &[];
        };
        let ring = &self.ring;
        let dims = self.dims;
        self.centroids[idx].refresh_with(self.versions[idx], |buf| {
            fill_centroid(buf, ring.as_slice(), variant, dims)
        })
    }

    /// The centroid without touching the cache.
    pub fn centroid_snapshot(&self, variant: Variant) -> Vec<f64> {
        let Some(idx) = variant.index() else {
            return Vec::new();
        };
        if let Some(cached) = self.centroids[idx].get(self.versions[idx]) {
            return cached.clone();
        }
        let mut buf = Vec::new();
        fill_centroid(&mut buf, self.ring.as_slice(), variant, self.dims);
        buf
    }

    /// Brings centroids and scores up to date so that shared readers can
    /// draw from the caches.
    pub fn refresh_caches(&mut self) {
        for variant in Variant::defined() {
            self.centroid(variant);
        }
        let key = self.score_key();
        let [a, b] = &self.centroids;
        let centroids = [a.get(self.versions[0]), b.get(self.versions[1])];
        if let [Some(ca), Some(cb)] = centroids {
            let (ring, tools) = (&self.ring, &self.tools);
            self.scores.refresh_with(key, |buf| {
                fill_scores(buf, ring.as_slice(), [ca.as_slice(), cb.as_slice()], tools)
            });
        }
    }

    pub fn has_fresh_caches(&self) -> bool {
        self.scores.is_fresh(self.score_key())
    }

    /// The percept of `stimulus` heard at `closeness`.
    pub fn percept(&mut self, stimulus: &Exemplar, closeness: f64) -> Exemplar {
        let perception = self.perception;
        perception.perceive(self, stimulus, closeness)
    }

    /// Score-weighted random draw. Uses the cached scores when fresh and
    /// computes a private copy otherwise.
    pub fn good_exemplar<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&Exemplar, LexiconError> {
        if self.is_empty() {
            return Err(LexiconError::Empty);
        }

        let local;
        let scores: &[f64] = match self.scores.get(self.score_key()) {
            Some(cached) => cached.as_slice(),
            None => {
                let centroids = [
                    self.centroid_snapshot(Variant::A),
                    self.centroid_snapshot(Variant::B),
                ];
                let mut buf = Vec::new();
                fill_scores(
                    &mut buf,
                    self.ring.as_slice(),
                    [centroids[0].as_slice(), centroids[1].as_slice()],
                    &self.tools,
                );
                local = buf;
                local.as_slice()
            }
        };

        let total: f64 = scores.iter().sum();
        if !(total > 0.0) {
            return Err(LexiconError::DegenerateScores);
        }

        let slots = self.ring.as_slice();
        let mut remaining = rng.gen::<f64>() * total;
        for (exemplar, score) in slots.iter().zip(scores) {
            remaining -= score;
            if remaining <= 0.0 {
                return Ok(exemplar);
            }
        }
        slots.last().ok_or(LexiconError::Empty)
    }

    /// Share of `A` among stored exemplars.
    pub fn variant_a_ratio(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.counts[0] as f64 / self.len() as f64)
        }
    }

    fn score_key(&self) -> (u64, u64) {
        (self.versions[0], self.versions[1])
    }
}

fn fill_centroid(buf: &mut Vec<f64>, slots: &[Exemplar], variant: Variant, dims: usize) {
    buf.clear();
    buf.resize(dims, 0.0);
    let mut count = 0usize;
    for e in slots.iter().filter(|e| e.variant() == variant) {
        for (acc, x) in buf.iter_mut().zip(e.features()) {
            *acc += x;
        }
        count += 1;
    }
    if count > 0 {
        for acc in buf.iter_mut() {
            *acc /= count as f64;
        }
    }
}

fn fill_scores(buf: &mut Vec<f64>, slots: &[Exemplar], centroids: [&[f64]; 2], tools: &ExemplarTools) {
    buf.clear();
    buf.extend(slots.iter().map(|e| match e.variant().index() {
        Some(i) => tools.score(e, centroids[i]),
        None => 0.0,
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::exemplar::NoiseModel;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use variant_events::Gender;

    fn tools() -> ExemplarTools {
        ExemplarTools::new(1.0, 1.0, 1.0, 13.0)
    }

    fn lexicon(capacity: usize, dims: usize) -> Lexicon {
        Lexicon::new(
            capacity,
            dims,
            tools(),
            SimilarityKernel::Global,
            Perception::Magnet {
                min_similarity: 0.001,
            },
        )
        .unwrap()
    }

    fn ex(variant: Variant, features: Vec<f64>) -> Exemplar {
        Exemplar::new(variant, 0.2, Gender::Female, 0.5, features, 0.7)
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let result = Lexicon::new(
            0,
            2,
            tools(),
            SimilarityKernel::Global,
            Perception::Linear,
        );
        assert!(matches!(result, Err(LexiconError::ZeroCapacity)));
    }

    #[test]
    fn test_capacity_and_order_after_wrap() {
        let mut lex = lexicon(3, 1);
        for i in 0..5 {
            lex.add(ex(Variant::A, vec![i as f64])).unwrap();
            assert!(lex.len() <= lex.capacity());
        }
        let order: Vec<f64> = lex.iter().map(|e| e.features()[0]).collect();
        assert_eq!(order, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_undefined_and_wrong_dims_are_rejected() {
        let mut lex = lexicon(3, 2);
        assert!(matches!(
            lex.add(ex(Variant::Undefined, vec![0.0, 0.0])),
            Err(LexiconError::UnstorableVariant(Variant::Undefined))
        ));
        assert!(matches!(
            lex.add(ex(Variant::A, vec![0.0])),
            Err(LexiconError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
        assert!(lex.is_empty());
    }

    #[test]
    fn test_eviction_updates_counts_and_versions() {
        let mut lex = lexicon(2, 1);
        lex.add(ex(Variant::A, vec![0.0])).unwrap();
        lex.add(ex(Variant::A, vec![1.0])).unwrap();
        let version_a = lex.version(Variant::A);

        let evicted = lex.add(ex(Variant::B, vec![2.0])).unwrap();
        assert_eq!(evicted.map(|e| e.features()[0]), Some(0.0));
        assert_eq!(lex.count(Variant::A), 1);
        assert_eq!(lex.count(Variant::B), 1);
        assert!(lex.version(Variant::A) > version_a);
        assert_eq!(lex.variant_a_ratio(), Some(0.5));
    }

    #[test]
    fn test_centroid_matches_gaussian_mean() {
        let mut rng = SmallRng::seed_from_u64(21);
        let noise = NoiseModel::new(1.0, 100.0);
        let proto = Exemplar::prototype(Variant::A, vec![3.0, -2.0, 10.0]);
        let mut lex = lexicon(4000, 3);
        for _ in 0..4000 {
            lex.add(noise.noisy_copy(&proto, 0.1, Gender::Male, &mut rng)).unwrap();
        }
        let centroid = lex.centroid(Variant::A).to_vec();
        for (c, p) in centroid.iter().zip(proto.features()) {
            assert!((c - p).abs() < 0.1, "centroid {} too far from {}", c, p);
        }
        assert_eq!(lex.centroid(Variant::B), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_centroid_cache_follows_versions() {
        let mut lex = lexicon(4, 1);
        lex.add(ex(Variant::A, vec![2.0])).unwrap();
        assert_eq!(lex.centroid(Variant::A), &[2.0]);
        lex.add(ex(Variant::A, vec![4.0])).unwrap();
        assert_eq!(lex.centroid(Variant::A), &[3.0]);
        assert_eq!(lex.centroid_snapshot(Variant::A), vec![3.0]);
    }

    #[test]
    fn test_similarity_is_bounded() {
        let mut rng = SmallRng::seed_from_u64(2);
        let noise = NoiseModel::new(3.0, 10.0);
        let pa = Exemplar::prototype(Variant::A, vec![0.0, 0.0]);
        let pb = Exemplar::prototype(Variant::B, vec![6.0, 6.0]);
        let mut global = lexicon(200, 2);
        let mut epsilon = Lexicon::new(
            200,
            2,
            tools(),
            SimilarityKernel::Epsilon { epsilon: 2.0 },
            Perception::Linear,
        )
        .unwrap();
        for i in 0..200 {
            let proto = if i % 3 == 0 { &pb } else { &pa };
            let e = noise.noisy_copy(proto, 0.1, Gender::Male, &mut rng);
            global.add(e.clone()).unwrap();
            epsilon.add(e).unwrap();
        }
        for _ in 0..100 {
            let stim = noise.noisy_copy(&pa, 0.1, Gender::Male, &mut rng);
            for variant in Variant::defined() {
                for lex in [&global, &epsilon] {
                    let s = lex.similarity(stim.features(), variant);
                    assert!((0.0..=1.0).contains(&s), "similarity {} out of range", s);
                }
            }
        }
    }

    #[test]
    fn test_magnet_percept_on_empty_lexicon_is_raw() {
        let mut lex = lexicon(4, 2);
        let stim = Exemplar::new(Variant::B, 0.4, Gender::Male, 0.0, vec![1.0, 2.0], 0.0);
        let p = lex.percept(&stim, 0.5);
        assert_eq!(p.variant(), Variant::B);
        assert_eq!(p.features(), &[1.0, 2.0]);
        assert_eq!(p.closeness(), 0.5);
        assert!((p.social_score() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_magnet_percept_pulls_toward_winner() {
        let mut lex = lexicon(8, 1);
        lex.add(ex(Variant::A, vec![0.0])).unwrap();
        lex.add(ex(Variant::B, vec![10.0])).unwrap();
        let stim = Exemplar::new(Variant::B, 0.4, Gender::Male, 0.0, vec![1.0], 0.0);
        let p = lex.percept(&stim, 0.0);
        assert_eq!(p.variant(), Variant::A);
        let sim = (-1.0f64).exp();
        let expected = sim * 0.0 + (1.0 - sim) * 1.0;
        assert!((p.features()[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_magnet_percept_ties_go_to_b() {
        let mut lex = lexicon(8, 1);
        lex.add(ex(Variant::A, vec![-1.0])).unwrap();
        lex.add(ex(Variant::B, vec![1.0])).unwrap();
        let stim = Exemplar::new(Variant::A, 0.4, Gender::Male, 0.0, vec![0.0], 0.0);
        assert_eq!(lex.percept(&stim, 0.0).variant(), Variant::B);
    }

    #[test]
    fn test_magnet_percept_undefined_below_threshold() {
        let mut lex = Lexicon::new(
            8,
            1,
            ExemplarTools::new(1.0, 1.0, 1.0, 2.0),
            SimilarityKernel::Global,
            Perception::Magnet { min_similarity: 0.5 },
        )
        .unwrap();
        lex.add(ex(Variant::A, vec![0.0])).unwrap();
        let stim = Exemplar::new(Variant::A, 0.4, Gender::Male, 0.0, vec![9.0], 0.0);
        let p = lex.percept(&stim, 0.3);
        assert_eq!(p.variant(), Variant::Undefined);
        assert_eq!(p.features(), &[9.0]);
    }

    #[test]
    fn test_linear_percept_keeps_stimulus() {
        let mut lex = Lexicon::new(8, 1, tools(), SimilarityKernel::Global, Perception::Linear).unwrap();
        lex.add(ex(Variant::A, vec![0.0])).unwrap();
        let stim = Exemplar::new(Variant::B, 0.4, Gender::Male, 0.0, vec![0.1], 0.0);
        let p = lex.percept(&stim, 1.0);
        assert_eq!(p.variant(), Variant::B);
        assert_eq!(p.features(), &[0.1]);
        assert!((p.social_score() - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_good_exemplar_errors() {
        let mut rng = SmallRng::seed_from_u64(1);
        let lex = lexicon(4, 1);
        assert!(matches!(lex.good_exemplar(&mut rng), Err(LexiconError::Empty)));

        let mut zero = Lexicon::new(
            4,
            1,
            ExemplarTools::new(0.0, 1.0, 1.0, 13.0),
            SimilarityKernel::Global,
            Perception::Linear,
        )
        .unwrap();
        zero.add(Exemplar::new(Variant::A, 0.0, Gender::Male, 0.0, vec![0.0], 0.0))
            .unwrap();
        assert!(matches!(
            zero.good_exemplar(&mut rng),
            Err(LexiconError::DegenerateScores)
        ));
    }

    #[test]
    fn test_good_exemplar_cached_and_uncached_agree() {
        let mut lex = lexicon(16, 1);
        for i in 0..16 {
            let v = if i % 2 == 0 { Variant::A } else { Variant::B };
            lex.add(ex(v, vec![i as f64])).unwrap();
        }
        assert!(!lex.has_fresh_caches());

        let mut rng = SmallRng::seed_from_u64(99);
        let uncached: Vec<f64> = (0..20)
            .map(|_| lex.good_exemplar(&mut rng).unwrap().features()[0])
            .collect();

        lex.refresh_caches();
        assert!(lex.has_fresh_caches());
        let mut rng = SmallRng::seed_from_u64(99);
        let cached: Vec<f64> = (0..20)
            .map(|_| lex.good_exemplar(&mut rng).unwrap().features()[0])
            .collect();
        assert_eq!(uncached, cached);

        lex.add(ex(Variant::A, vec![0.5])).unwrap();
        assert!(!lex.has_fresh_caches());
    }
}
