//! Categorical sampling strategies.
//!
//! The engine picks a discrete index in three places: an unobserved outcome,
//! an unresolved hidden state and the action to emit. The default strategy is
//! deterministic arg-max ("most likely"); a weighted random draw is available
//! behind the same [`Sampler`] trait for callers that want exploration.

use std::fmt;

use ndarray::ArrayView1;
use rand::{Rng, SeedableRng, distr::StandardUniform, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::numeric::argmax;

/// Picks an index from a (possibly unnormalized) categorical distribution.
pub trait Sampler: Send + fmt::Debug {
    fn sample(&mut self, distribution: ArrayView1<'_, f64>) -> usize;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Deterministic "most likely" choice; ties resolve to the lowest index.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgMaxSampler;

impl Sampler for ArgMaxSampler {
    fn sample(&mut self, distribution: ArrayView1<'_, f64>) -> usize {
        argmax(&distribution)
    }

    fn name(&self) -> &'static str {
        "arg_max"
    }
}

/// Weighted random draw proportional to the distribution's entries.
#[derive(Debug, Clone)]
pub struct WeightedSampler {
    rng: StdRng,
}

impl WeightedSampler {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }
}

impl Sampler for WeightedSampler {
    fn sample(&mut self, distribution: ArrayView1<'_, f64>) -> usize {
        weighted_index(&mut self.rng, distribution)
    }

    fn name(&self) -> &'static str {
        "weighted"
    }
}

/// Draw an index with probability proportional to its (non-negative) weight.
///
/// Negative and non-finite weights count as zero. When no weight is positive
/// the draw is uniform over all indices. An empty distribution returns 0.
pub fn weighted_index<R: Rng>(rng: &mut R, weights: ArrayView1<'_, f64>) -> usize {
    let len = weights.len();
    if len == 0 {
        return 0;
    }

    let clean = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
    let total: f64 = weights.iter().map(|&w| clean(w)).sum();
    if total <= 0.0 {
        return rng.random_range(0..len);
    }

    let mut threshold = rng.sample::<f64, _>(StandardUniform) * total;
    for (index, &weight) in weights.iter().enumerate() {
        let w = clean(weight);
        if threshold < w {
            return index;
        }
        threshold -= w;
    }

    // Rounding can leave a sliver of threshold; fall back to the last
    // index that carried weight.
    weights
        .iter()
        .rposition(|&w| clean(w) > 0.0)
        .unwrap_or(len - 1)
}

/// Serializable choice of [`Sampler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SamplingStrategy {
    /// Always choose the most probable index.
    #[default]
    ArgMax,
    /// Draw proportionally to probability, optionally seeded.
    Weighted { seed: Option<u64> },
}

impl SamplingStrategy {
    /// Instantiate the sampler this strategy describes.
    pub fn build(&self) -> Box<dyn Sampler> {
        match *self {
            SamplingStrategy::ArgMax => Box::new(ArgMaxSampler),
            SamplingStrategy::Weighted { seed } => Box::new(WeightedSampler::new(seed)),
        }
    }
}
