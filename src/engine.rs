//! Active-inference engine
//!
//! One engine, two composable per-tick operations:
//!
//! - [`Engine::infer`] resolves the tick's hidden state and observation and
//!   runs variational message passing for every policy, returning the
//!   per-policy free energy (the beliefs live in the [`Episode`]).
//! - [`Engine::select_action`] scores policies by expected free energy,
//!   forms the policy posterior, averages beliefs across policies and picks
//!   an action.
//!
//! [`Engine::run_episode`] is the sequential composition of both over the
//! horizon followed by the learning update of the initial-state belief.
//!
//! ## Module Structure
//!
//! - [`normalized`]: working (normalized, log-domain) model forms
//! - [`episode`]: per-episode context owning `PosteriorStates`
//! - [`estimator`]: variational state estimation
//! - [`policy`]: expected free energy, policy posterior, action selection
//! - [`learning`]: initial-state belief and its update

pub mod episode;
pub mod estimator;
pub mod learning;
pub mod normalized;
pub mod policy;

pub use episode::{Episode, EpisodeInputs, EpisodeReport, TickStage};
pub use estimator::StateInference;
pub use learning::{BeliefParameter, LearningOutcome, PriorBelief};
pub use normalized::NormalizedModel;
pub use policy::PolicySelection;

use tracing::{debug, info};

use crate::{Error, Result, config::EngineConfig, model::GenerativeModel};

/// Stateless inference engine over a normalized generative model.
///
/// The engine is shared read-only between ticks and episodes; all mutable
/// state lives in the [`Episode`] and the caller's [`PriorBelief`].
///
/// # Examples
///
/// ```
/// use aip::{config::EngineConfig, engine::{Engine, EpisodeInputs}, models::battery};
///
/// let engine = Engine::new(&battery::model(), EngineConfig::default())?;
/// let mut prior = engine.initial_prior();
/// let report = engine.run_episode(&mut prior, EpisodeInputs::first_observation(battery::LOW))?;
/// assert_eq!(report.first_action(), Some(battery::CHARGE));
/// # Ok::<(), aip::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    model: NormalizedModel,
    config: EngineConfig,
}

impl Engine {
    /// Normalize `model` and validate `config`.
    pub fn new(model: &GenerativeModel, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let model = NormalizedModel::new(model)?;
        Ok(Self { model, config })
    }

    pub fn model(&self) -> &NormalizedModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut NormalizedModel {
        &mut self.model
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Prior derived from the model at construction.
    pub fn initial_prior(&self) -> PriorBelief {
        self.model.initial_prior().clone()
    }

    /// Start an episode from `prior` with optional pre-supplied inputs.
    pub fn begin_episode(&self, prior: &PriorBelief, inputs: EpisodeInputs) -> Result<Episode> {
        let sampler = self.config.sampling.build();
        debug!(
            sampler = sampler.name(),
            horizon = self.model.horizon(),
            "starting episode"
        );
        Episode::new(&self.model, prior, inputs, sampler)
    }

    /// State estimation for the episode's next tick.
    ///
    /// `observation` overrides any pre-supplied observation for this tick;
    /// when neither exists the observation is sampled from the likelihood of
    /// the resolved hidden state.
    pub fn infer(&self, episode: &mut Episode, observation: Option<usize>) -> Result<StateInference> {
        estimator::infer_tick(&self.model, episode, observation, self.config.iterations)
    }

    /// Policy evaluation and action selection for the tick `inference` covers.
    pub fn select_action(
        &self,
        episode: &mut Episode,
        inference: &StateInference,
    ) -> Result<PolicySelection> {
        policy::select_for_tick(&self.model, episode, inference)
    }

    /// Close a completed episode and apply the learning update to `prior`.
    pub fn finish_episode(&self, episode: Episode, prior: &mut PriorBelief) -> Result<EpisodeReport> {
        if !episode.is_complete() {
            return Err(Error::TickOrder {
                tick: episode.next_tick(),
                message: format!(
                    "episode finished before all {} ticks were processed",
                    episode.horizon()
                ),
            });
        }

        let learning = prior.update(episode.marginal.column(0));
        info!(
            most_likely_state = learning.most_likely_state,
            learned = learning.learned,
            actions = ?episode.actions,
            "episode complete"
        );

        Ok(EpisodeReport {
            observations: episode.observations.iter().flatten().copied().collect(),
            hidden_states: episode.hidden_states.iter().flatten().copied().collect(),
            actions: episode.actions,
            free_energy: episode.free_energy,
            expected_free_energy: episode.expected_free_energy,
            policy_posterior: episode.policy_posterior,
            marginal: episode.marginal,
            learning,
        })
    }

    /// Run every tick of one episode, then learn.
    pub fn run_episode(&self, prior: &mut PriorBelief, inputs: EpisodeInputs) -> Result<EpisodeReport> {
        let mut episode = self.begin_episode(prior, inputs)?;
        while episode.next_tick() < episode.horizon() {
            let inference = self.infer(&mut episode, None)?;
            self.select_action(&mut episode, &inference)?;
        }
        self.finish_episode(episode, prior)
    }
}
