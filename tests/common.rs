//! Common test utilities for the aip test suite.
//!
//! Random generative models built from Dirichlet-distributed columns so
//! property tests cover more than the hand-written fixtures.

#![allow(dead_code)]

use std::f64::consts::PI;

use aip::GenerativeModel;
use ndarray::{Array1, Array2, Array3, Axis};
use rand::{Rng, SeedableRng, distr::StandardUniform, rngs::StdRng};

/// Seeded RNG so failures are reproducible.
pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Sample from a Dirichlet distribution using the Gamma-Dirichlet relationship.
///
/// The result sums to 1.0.
pub fn sample_dirichlet(alpha: &[f64], rng: &mut StdRng) -> Vec<f64> {
    let mut draws = Vec::with_capacity(alpha.len());
    let mut total = 0.0;
    for &a in alpha {
        let value = sample_gamma(a, rng);
        draws.push(value);
        total += value;
    }
    draws.iter_mut().for_each(|value| *value /= total);
    draws
}

/// A `rows × cols` matrix whose columns are independent Dir(1, …, 1) draws.
pub fn random_column_stochastic(rows: usize, cols: usize, rng: &mut StdRng) -> Array2<f64> {
    let alpha = vec![1.0; rows];
    let mut matrix = Array2::zeros((rows, cols));
    for mut column in matrix.columns_mut() {
        column.assign(&Array1::from(sample_dirichlet(&alpha, rng)));
    }
    matrix
}

/// Random raw model: stochastic A and B, random C, uniform E, every
/// action sequence of length `steps` as the policy set.
pub fn random_model(
    n_states: usize,
    n_outcomes: usize,
    n_actions: usize,
    steps: usize,
    rng: &mut StdRng,
) -> GenerativeModel {
    let likelihood = random_column_stochastic(n_outcomes, n_states, rng);

    let mut transition = Array3::zeros((n_states, n_states, n_actions));
    for mut slice in transition.axis_iter_mut(Axis(2)) {
        slice.assign(&random_column_stochastic(n_states, n_states, rng));
    }

    let preference =
        Array1::from_shape_fn(n_outcomes, |_| 4.0 * rng.sample::<f64, _>(StandardUniform) - 2.0);
    let policy_set = all_policies(n_actions, steps);
    let policy_prior = Array1::ones(policy_set.nrows());

    GenerativeModel::new(likelihood, transition, preference, policy_prior, policy_set)
}

/// Every action sequence of length `steps`, one per row.
pub fn all_policies(n_actions: usize, steps: usize) -> Array2<usize> {
    let n_policies = n_actions.pow(steps as u32);
    Array2::from_shape_fn((n_policies, steps), |(policy, step)| {
        (policy / n_actions.pow((steps - 1 - step) as u32)) % n_actions
    })
}

/// Sample from a standard normal distribution using Box-Muller transform.
fn sample_standard_normal(rng: &mut StdRng) -> f64 {
    let mut u1: f64 = rng.sample(StandardUniform);
    u1 = u1.max(1e-12);
    let u2: f64 = rng.sample(StandardUniform);
    let radius = (-2.0 * u1.ln()).sqrt();
    let angle = 2.0 * PI * u2;
    radius * angle.cos()
}

/// Sample from Gamma(shape, 1.0) using Marsaglia and Tsang's method.
///
/// # Panics
///
/// Panics if shape <= 0
fn sample_gamma(shape: f64, rng: &mut StdRng) -> f64 {
    assert!(shape > 0.0, "gamma shape must be positive");
    if shape < 1.0 {
        let u: f64 = rng.sample(StandardUniform);
        let u = u.max(1e-12);
        return sample_gamma(shape + 1.0, rng) * u.powf(1.0 / shape);
    }

    let d = shape - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();

    loop {
        let x = sample_standard_normal(rng);
        let v_candidate = 1.0 + c * x;
        if v_candidate <= 0.0 {
            continue;
        }
        let v = v_candidate * v_candidate * v_candidate;
        let u: f64 = rng.sample(StandardUniform);

        if u < 1.0 - 0.0331 * x.powi(4) {
            return d * v;
        }

        if u.ln() < 0.5 * x * x + d * (1.0 - v + v.ln()) {
            return d * v;
        }
    }
}
