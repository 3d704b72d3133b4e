//! Variational state estimation.
//!
//! For every policy the estimator sweeps the horizon a fixed number of times,
//! combining three log-domain messages per position `tau`:
//!
//! - the likelihood of the observation at `tau` (only for `tau <= t`),
//! - an empirical prior: at `tau = 0` the log prior plus a backward message
//!   from `tau + 1`, otherwise a forward message from `tau - 1`,
//! - the entropy term `ln s(tau)`.
//!
//! The belief is then re-derived as `softmax(ln s + ∇F)` where
//! `∇F = prior + likelihood − ln s`. The sweep count is a fixed truncation;
//! there is no convergence test.

use ndarray::{Array1, ArrayView1, ArrayView2, ArrayViewMut2, Axis};
use serde::Serialize;
use tracing::{debug, trace};

use crate::{
    Error, Result,
    engine::{
        NormalizedModel,
        episode::{Episode, TickStage},
    },
    numeric::{safe_log, softmax},
};

/// Outcome of state estimation for one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateInference {
    pub tick: usize,
    pub observation: usize,
    pub hidden_state: usize,
    /// Accumulated (negative) variational free energy per policy
    pub free_energy: Array1<f64>,
}

/// Resolve the tick's hidden state and observation, then run message passing
/// for every policy.
pub(crate) fn infer_tick(
    model: &NormalizedModel,
    episode: &mut Episode,
    observation: Option<usize>,
    iterations: usize,
) -> Result<StateInference> {
    let tick = episode.next_tick;
    let horizon = episode.horizon();
    if tick >= horizon {
        return Err(Error::EpisodeComplete { horizon });
    }
    if episode.stage != TickStage::AwaitingObservation {
        return Err(Error::TickOrder {
            tick,
            message: "tick is still awaiting action selection".to_string(),
        });
    }

    let hidden_state = resolve_hidden_state(model, episode, tick)?;
    let observation = resolve_observation(model, episode, tick, hidden_state, observation)?;
    episode.record_observation(tick, observation);

    debug!(tick, observation, hidden_state, "estimating hidden states");
    episode.stage = TickStage::Iterating;

    let n_policies = model.dims().n_policies;
    let mut free_energy = Array1::zeros(n_policies);
    for (policy, beliefs) in episode.posterior.axis_iter_mut(Axis(2)).enumerate() {
        free_energy[policy] = estimate_policy(
            model,
            policy,
            beliefs,
            episode.ln_prior.view(),
            episode.observation_matrix.view(),
            tick,
            iterations,
        );
    }

    episode.free_energy.column_mut(tick).assign(&free_energy);
    episode.stage = TickStage::Converged;
    debug!(tick, free_energy = ?free_energy.to_vec(), "state estimation converged");

    Ok(StateInference {
        tick,
        observation,
        hidden_state,
        free_energy,
    })
}

fn resolve_hidden_state(
    model: &NormalizedModel,
    episode: &mut Episode,
    tick: usize,
) -> Result<usize> {
    if let Some(state) = episode.hidden_states[tick] {
        return Ok(state);
    }

    let state = if tick == 0 {
        let prior = episode.prior.view();
        episode.sampler.sample(prior)
    } else {
        let previous = episode.hidden_states[tick - 1].ok_or_else(|| Error::TickOrder {
            tick,
            message: "previous hidden state was never resolved".to_string(),
        })?;
        let action = episode.actions[tick - 1].ok_or_else(|| Error::TickOrder {
            tick,
            message: "no action was selected at the previous tick".to_string(),
        })?;
        episode
            .sampler
            .sample(model.forward(action).column(previous))
    };

    episode.hidden_states[tick] = Some(state);
    Ok(state)
}

fn resolve_observation(
    model: &NormalizedModel,
    episode: &mut Episode,
    tick: usize,
    hidden_state: usize,
    supplied: Option<usize>,
) -> Result<usize> {
    let n_outcomes = model.dims().n_outcomes;
    match supplied.or(episode.observations[tick]) {
        Some(observation) if observation >= n_outcomes => Err(Error::ObservationOutOfRange {
            observation,
            n_outcomes,
        }),
        Some(observation) => Ok(observation),
        None => Ok(episode
            .sampler
            .sample(model.likelihood().column(hidden_state))),
    }
}

/// Truncated variational message passing for a single policy.
///
/// `beliefs` is the policy's states × horizon slice of `PosteriorStates` and
/// is updated in place. Positions are swept in order, so the forward message
/// at `tau` reads this sweep's belief at `tau − 1` while the backward message
/// at `tau = 0` reads the previous sweep's belief at `tau = 1`.
///
/// Returns the free energy accumulated over the final sweep.
pub fn estimate_policy(
    model: &NormalizedModel,
    policy: usize,
    mut beliefs: ArrayViewMut2<'_, f64>,
    ln_prior: ArrayView1<'_, f64>,
    observations: ArrayView2<'_, f64>,
    tick: usize,
    iterations: usize,
) -> f64 {
    let n_states = beliefs.nrows();
    let horizon = beliefs.ncols();
    let actions = model.policy_actions(policy);
    let ln_likelihood_t = model.ln_likelihood().reversed_axes();

    let mut free_energy = 0.0;
    for iteration in 0..iterations {
        free_energy = 0.0;
        for tau in 0..horizon {
            let current = beliefs.column(tau).to_owned();

            let likelihood_message = if tau <= tick {
                ln_likelihood_t.dot(&observations.column(tau))
            } else {
                Array1::zeros(n_states)
            };

            let entropy = safe_log(&current);

            // Free energy at tau = 0 uses the log prior alone: the transition
            // factor is counted once, through the forward message at tau = 1.
            let (prior_message, energy_prior) = if tau == 0 {
                let mut message = ln_prior.to_owned();
                if horizon > 1 {
                    message += &model.ln_backward(actions[0]).dot(&beliefs.column(1));
                }
                (message, ln_prior.to_owned())
            } else {
                let message = model
                    .ln_forward(actions[tau - 1])
                    .dot(&beliefs.column(tau - 1));
                (message.clone(), message)
            };

            let gradient = &prior_message + &likelihood_message - &entropy;
            free_energy += current.dot(&(&energy_prior - &entropy - &likelihood_message));

            let updated = softmax(&(&entropy + &gradient));
            beliefs.column_mut(tau).assign(&updated);
        }
        trace!(policy, iteration, free_energy, "variational sweep");
    }

    free_energy
}
