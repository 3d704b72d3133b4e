//! Per-episode inference context.
//!
//! An [`Episode`] exclusively owns the `PosteriorStates` tensor
//! (states × horizon × policies) together with the resolved observation and
//! hidden-state sequences and the free-energy, expected-free-energy, policy
//! and action logs. It is created from a [`PriorBelief`], advanced one tick at
//! a time by the engine and consumed when the episode is finished.

use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2, ArrayView3, Axis};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    engine::{NormalizedModel, learning::PriorBelief},
    numeric::{one_hot, safe_log},
    sampling::Sampler,
};

/// Where the current tick is in its inference cycle.
///
/// `Iterating` only exists inside [`crate::engine::Engine::infer`]; callers
/// observe the other two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickStage {
    AwaitingObservation,
    Iterating,
    Converged,
}

/// Externally supplied per-tick inputs; `None` entries are resolved by sampling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeInputs {
    #[serde(default)]
    pub observations: Vec<Option<usize>>,
    #[serde(default)]
    pub hidden_states: Vec<Option<usize>>,
}

impl EpisodeInputs {
    /// Only the first observation is known; later ticks are sampled.
    pub fn first_observation(observation: usize) -> Self {
        Self {
            observations: vec![Some(observation)],
            hidden_states: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct Episode {
    pub(crate) posterior: Array3<f64>,
    pub(crate) prior: Array1<f64>,
    pub(crate) ln_prior: Array1<f64>,
    pub(crate) observations: Vec<Option<usize>>,
    pub(crate) hidden_states: Vec<Option<usize>>,
    pub(crate) observation_matrix: Array2<f64>,
    pub(crate) free_energy: Array2<f64>,
    pub(crate) expected_free_energy: Array2<f64>,
    pub(crate) policy_posterior: Array2<f64>,
    pub(crate) marginal: Array2<f64>,
    pub(crate) actions: Vec<Option<usize>>,
    pub(crate) next_tick: usize,
    pub(crate) stage: TickStage,
    pub(crate) sampler: Box<dyn Sampler>,
}

impl Episode {
    /// Allocate a fresh context: every policy's time-0 belief is the prior,
    /// every later slot is uniform.
    pub(crate) fn new(
        model: &NormalizedModel,
        prior: &PriorBelief,
        inputs: EpisodeInputs,
        sampler: Box<dyn Sampler>,
    ) -> Result<Self> {
        let dims = model.dims();
        let horizon = dims.horizon;

        if inputs.observations.len() > horizon {
            return Err(Error::DimensionMismatch {
                what: "observation sequence".to_string(),
                expected: horizon,
                got: inputs.observations.len(),
            });
        }
        if inputs.hidden_states.len() > horizon {
            return Err(Error::DimensionMismatch {
                what: "hidden state sequence".to_string(),
                expected: horizon,
                got: inputs.hidden_states.len(),
            });
        }
        for &observation in inputs.observations.iter().flatten() {
            if observation >= dims.n_outcomes {
                return Err(Error::ObservationOutOfRange {
                    observation,
                    n_outcomes: dims.n_outcomes,
                });
            }
        }
        for &state in inputs.hidden_states.iter().flatten() {
            if state >= dims.n_states {
                return Err(Error::HiddenStateOutOfRange {
                    state,
                    n_states: dims.n_states,
                });
            }
        }
        if prior.belief().len() != dims.n_states {
            return Err(Error::DimensionMismatch {
                what: "prior belief".to_string(),
                expected: dims.n_states,
                got: prior.belief().len(),
            });
        }

        let mut observations = inputs.observations;
        observations.resize(horizon, None);
        let mut hidden_states = inputs.hidden_states;
        hidden_states.resize(horizon, None);

        let prior_belief = prior.belief().to_owned();
        let mut posterior =
            Array3::from_elem((dims.n_states, horizon, dims.n_policies), 1.0 / dims.n_states as f64);
        for mut policy_slice in posterior.axis_iter_mut(Axis(2)) {
            policy_slice.column_mut(0).assign(&prior_belief);
        }

        let mut marginal = Array2::from_elem((dims.n_states, horizon), 1.0 / dims.n_states as f64);
        marginal.column_mut(0).assign(&prior_belief);

        Ok(Self {
            posterior,
            ln_prior: safe_log(&prior_belief),
            prior: prior_belief,
            observations,
            hidden_states,
            observation_matrix: Array2::zeros((dims.n_outcomes, horizon)),
            free_energy: Array2::zeros((dims.n_policies, horizon)),
            expected_free_energy: Array2::zeros((dims.n_policies, horizon)),
            policy_posterior: Array2::zeros((dims.n_policies, horizon)),
            marginal,
            actions: vec![None; horizon.saturating_sub(1)],
            next_tick: 0,
            stage: TickStage::AwaitingObservation,
            sampler,
        })
    }

    pub fn horizon(&self) -> usize {
        self.observations.len()
    }

    /// Index of the next tick [`crate::engine::Engine::infer`] will process.
    pub fn next_tick(&self) -> usize {
        self.next_tick
    }

    pub fn stage(&self) -> TickStage {
        self.stage
    }

    /// True once every tick of the horizon has been inferred and scored.
    pub fn is_complete(&self) -> bool {
        self.next_tick >= self.horizon() && self.stage == TickStage::AwaitingObservation
    }

    /// `PosteriorStates[states, horizon, policies]`.
    pub fn posterior(&self) -> ArrayView3<'_, f64> {
        self.posterior.view()
    }

    /// Belief of one policy across the horizon (states × horizon).
    pub fn policy_beliefs(&self, policy: usize) -> ArrayView2<'_, f64> {
        self.posterior.index_axis(Axis(2), policy)
    }

    /// Working prior `D` this episode started from.
    pub fn prior(&self) -> ArrayView1<'_, f64> {
        self.prior.view()
    }

    /// Policy-averaged belief (states × horizon) from the last scored tick.
    pub fn marginal(&self) -> ArrayView2<'_, f64> {
        self.marginal.view()
    }

    pub fn observations(&self) -> &[Option<usize>] {
        &self.observations
    }

    pub fn hidden_states(&self) -> &[Option<usize>] {
        &self.hidden_states
    }

    pub fn actions(&self) -> &[Option<usize>] {
        &self.actions
    }

    /// Free energy per policy (rows) and tick (columns).
    pub fn free_energy(&self) -> ArrayView2<'_, f64> {
        self.free_energy.view()
    }

    pub fn expected_free_energy(&self) -> ArrayView2<'_, f64> {
        self.expected_free_energy.view()
    }

    pub fn policy_posterior(&self) -> ArrayView2<'_, f64> {
        self.policy_posterior.view()
    }

    /// Record a resolved observation in one-hot form.
    pub(crate) fn record_observation(&mut self, tick: usize, observation: usize) {
        self.observations[tick] = Some(observation);
        let column = one_hot(self.observation_matrix.nrows(), observation);
        self.observation_matrix.column_mut(tick).assign(&column);
    }
}

/// Everything an external collaborator may inspect after an episode.
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeReport {
    pub observations: Vec<usize>,
    pub hidden_states: Vec<usize>,
    pub actions: Vec<Option<usize>>,
    /// Free energy per policy × tick
    pub free_energy: Array2<f64>,
    /// Expected free energy per policy × tick
    pub expected_free_energy: Array2<f64>,
    /// Policy posterior per policy × tick
    pub policy_posterior: Array2<f64>,
    /// Policy-averaged belief per state × horizon position
    pub marginal: Array2<f64>,
    pub learning: crate::engine::learning::LearningOutcome,
}

impl EpisodeReport {
    /// First action emitted in the episode, if any.
    pub fn first_action(&self) -> Option<usize> {
        self.actions.first().copied().flatten()
    }
}
