//! Policy evaluation and action selection.
//!
//! Policies are scored by expected free energy over the remaining horizon,
//! combined with the variational free energy from state estimation and the
//! log policy prior into a softmax posterior. The action is drawn from the
//! posterior marginalised onto the actions policies take at the current tick.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayView3, Axis};
use serde::Serialize;
use tracing::debug;

use crate::{
    Error, Result,
    engine::{
        NormalizedModel,
        episode::{Episode, TickStage},
        estimator::StateInference,
    },
    numeric::{safe_log, softmax},
};

/// Outcome of policy evaluation for one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicySelection {
    pub tick: usize,
    /// Expected free energy per policy (higher is better)
    pub expected_free_energy: Array1<f64>,
    pub policy_posterior: Array1<f64>,
    /// Posterior over actions at this tick; empty at the last tick
    pub action_posterior: Array1<f64>,
    /// `None` at the last horizon position
    pub action: Option<usize>,
}

/// Expected free energy of one policy from `tick` to the end of the horizon.
///
/// Each position contributes `qo · (lnC − ln qo)` with `qo = A · s(tau)`:
/// predicted outcomes matching the preference raise the score, uncertain
/// predictions lower it.
pub fn expected_free_energy(
    model: &NormalizedModel,
    beliefs: ArrayView2<'_, f64>,
    tick: usize,
) -> f64 {
    let likelihood = model.likelihood();
    let ln_preference = model.ln_preference();
    (tick..beliefs.ncols())
        .map(|tau| {
            let predicted = likelihood.dot(&beliefs.column(tau));
            let surprise = &ln_preference - &safe_log(&predicted);
            predicted.dot(&surprise)
        })
        .sum()
}

/// `softmax(lnE + G + F)`.
pub fn policy_posterior(
    ln_policy_prior: ArrayView1<'_, f64>,
    expected_free_energy: ArrayView1<'_, f64>,
    free_energy: ArrayView1<'_, f64>,
) -> Array1<f64> {
    softmax(&(&ln_policy_prior + &expected_free_energy + &free_energy))
}

/// Posterior over actions at `step`: policy mass summed by the action each
/// policy takes there, then renormalized through `softmax(ln ·)`.
pub fn action_posterior(
    policy_set: ArrayView2<'_, usize>,
    policy_posterior: ArrayView1<'_, f64>,
    n_actions: usize,
    step: usize,
) -> Array1<f64> {
    let mut mass = Array1::zeros(n_actions);
    for (policy, &probability) in policy_posterior.iter().enumerate() {
        mass[policy_set[[policy, step]]] += probability;
    }
    softmax(&safe_log(&mass))
}

/// Policy-weighted average of per-policy beliefs for every horizon position.
pub fn bayesian_model_average(
    posterior: ArrayView3<'_, f64>,
    policy_posterior: ArrayView1<'_, f64>,
) -> Array2<f64> {
    let (n_states, horizon, _) = posterior.dim();
    let mut marginal = Array2::zeros((n_states, horizon));
    for (beliefs, &weight) in posterior.axis_iter(Axis(2)).zip(policy_posterior.iter()) {
        marginal.scaled_add(weight, &beliefs);
    }
    marginal
}

/// Score every policy for the tick `inference` describes, record the logs,
/// average beliefs across policies and pick an action unless this is the
/// last horizon position.
pub(crate) fn select_for_tick(
    model: &NormalizedModel,
    episode: &mut Episode,
    inference: &StateInference,
) -> Result<PolicySelection> {
    let tick = inference.tick;
    if episode.stage != TickStage::Converged || tick != episode.next_tick {
        return Err(Error::TickOrder {
            tick: episode.next_tick,
            message: format!("no converged state estimation to score for tick {tick}"),
        });
    }
    if inference.free_energy.len() != model.dims().n_policies {
        return Err(Error::DimensionMismatch {
            what: "free energy".to_string(),
            expected: model.dims().n_policies,
            got: inference.free_energy.len(),
        });
    }

    let expected: Array1<f64> = episode
        .posterior
        .axis_iter(Axis(2))
        .map(|beliefs| expected_free_energy(model, beliefs, tick))
        .collect();

    let posterior = policy_posterior(
        model.ln_policy_prior(),
        expected.view(),
        inference.free_energy.view(),
    );

    episode.expected_free_energy.column_mut(tick).assign(&expected);
    episode.policy_posterior.column_mut(tick).assign(&posterior);
    episode.marginal = bayesian_model_average(episode.posterior.view(), posterior.view());

    let horizon = episode.horizon();
    let (action_distribution, action) = if tick + 1 < horizon {
        let distribution = action_posterior(
            model.policy_set(),
            posterior.view(),
            model.dims().n_actions,
            tick,
        );
        let action = episode.sampler.sample(distribution.view());
        episode.actions[tick] = Some(action);
        (distribution, Some(action))
    } else {
        (Array1::zeros(0), None)
    };

    debug!(
        tick,
        expected_free_energy = ?expected.to_vec(),
        policy_posterior = ?posterior.to_vec(),
        action,
        "policies evaluated"
    );

    episode.next_tick += 1;
    episode.stage = TickStage::AwaitingObservation;

    Ok(PolicySelection {
        tick,
        expected_free_energy: expected,
        policy_posterior: posterior,
        action_posterior: action_distribution,
        action,
    })
}

#[cfg(test)]
mod tests {
    use ndarray::{Array3, array};

    use super::*;

    #[test]
    fn policy_posterior_favours_lower_cost() {
        let posterior = policy_posterior(
            array![0.0, 0.0].view(),
            array![-1.0, -3.0].view(),
            array![0.0, 0.0].view(),
        );
        assert!(posterior[0] > posterior[1]);
        assert!((posterior.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn action_posterior_sums_policies_sharing_an_action() {
        let policy_set = array![[0, 1], [0, 0], [1, 1]];
        let marginal = action_posterior(policy_set.view(), array![0.3, 0.3, 0.4].view(), 2, 0);
        assert!((marginal[0] - 0.6).abs() < 1e-9);
        assert!((marginal[1] - 0.4).abs() < 1e-9);
    }

    #[test]
    fn model_average_weights_policies() {
        let mut posterior = Array3::zeros((2, 1, 2));
        posterior[[0, 0, 0]] = 1.0;
        posterior[[1, 0, 1]] = 1.0;
        let marginal = bayesian_model_average(posterior.view(), array![0.25, 0.75].view());
        assert_eq!(marginal, array![[0.25], [0.75]]);
    }
}
