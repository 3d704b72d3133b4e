//! Stateful agent wrapper.
//!
//! An [`Agent`] owns an [`Engine`] together with the persistent initial-state
//! prior and runs one full episode per environment tick: the caller hands in
//! the current observation, the agent infers, acts, learns and reports the
//! action to execute.

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    Error, Result,
    config::EngineConfig,
    engine::{BeliefParameter, Engine, EpisodeInputs, EpisodeReport, PriorBelief},
    model::GenerativeModel,
};

/// What the agent did on one environment tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStep {
    pub tick: usize,
    pub observation: usize,
    /// Action to execute, `None` when the model has a single-step horizon
    pub action: Option<usize>,
    /// Prior over hidden states after learning
    pub belief: Array1<f64>,
    pub most_likely_state: usize,
    /// Policy posterior at the first tick of the episode
    pub policy_posterior: Array1<f64>,
    pub free_energy: Array1<f64>,
    pub expected_free_energy: Array1<f64>,
}

impl AgentStep {
    fn from_report(tick: usize, report: &EpisodeReport) -> Self {
        Self {
            tick,
            observation: report.observations.first().copied().unwrap_or_default(),
            action: report.first_action(),
            belief: report.learning.belief.clone(),
            most_likely_state: report.learning.most_likely_state,
            policy_posterior: report.policy_posterior.column(0).to_owned(),
            free_energy: report.free_energy.column(0).to_owned(),
            expected_free_energy: report.expected_free_energy.column(0).to_owned(),
        }
    }
}

#[derive(Debug)]
pub struct Agent {
    engine: Engine,
    prior: PriorBelief,
    history: Vec<AgentStep>,
}

impl Agent {
    pub fn new(model: &GenerativeModel, config: EngineConfig) -> Result<Self> {
        let engine = Engine::new(model, config)?;
        let prior = engine.initial_prior();
        Ok(Self {
            engine,
            prior,
            history: Vec::new(),
        })
    }

    /// Replace the model's initial-state parameter with a previously learned one.
    pub fn with_parameter(mut self, parameter: BeliefParameter) -> Result<Self> {
        parameter.validate(self.engine.model().dims().n_states)?;
        self.prior = PriorBelief::learnable(parameter);
        Ok(self)
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn prior(&self) -> &PriorBelief {
        &self.prior
    }

    /// Learned parameter `d`, if the model carries one.
    pub fn parameter(&self) -> Option<&BeliefParameter> {
        self.prior.parameter()
    }

    pub fn current_belief(&self) -> ArrayView1<'_, f64> {
        self.prior.belief()
    }

    pub fn most_likely_state(&self) -> usize {
        self.prior.most_likely_state()
    }

    pub fn last_action(&self) -> Option<usize> {
        self.history.last().and_then(|step| step.action)
    }

    pub fn history(&self) -> &[AgentStep] {
        &self.history
    }

    /// Swap the preference vector `C` between ticks.
    pub fn set_preference(&mut self, preference: ArrayView1<'_, f64>) -> Result<()> {
        self.engine.model_mut().set_preference(preference)
    }

    /// Run one episode anchored on `observation` and learn from it.
    ///
    /// With `None` the first observation is sampled from the model.
    pub fn step(&mut self, observation: Option<usize>) -> Result<AgentStep> {
        let n_outcomes = self.engine.model().dims().n_outcomes;
        let inputs = match observation {
            Some(observation) if observation >= n_outcomes => {
                return Err(Error::ObservationOutOfRange {
                    observation,
                    n_outcomes,
                });
            }
            Some(observation) => EpisodeInputs::first_observation(observation),
            None => EpisodeInputs::default(),
        };

        let report = self.engine.run_episode(&mut self.prior, inputs)?;
        let step = AgentStep::from_report(self.history.len(), &report);

        let labels = self.engine.model().labels();
        info!(
            tick = step.tick,
            observation = %labels.outcome(step.observation),
            action = step.action.map(|a| labels.action(a)),
            belief = %labels.state(step.most_likely_state),
            "agent step"
        );

        self.history.push(step.clone());
        Ok(step)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::models::battery;

    fn battery_agent() -> Agent {
        Agent::new(&battery::model(), EngineConfig::default()).expect("valid battery model")
    }

    #[test]
    fn low_battery_triggers_charging() {
        let mut agent = battery_agent();
        let step = agent.step(Some(battery::LOW)).expect("step");
        assert_eq!(step.tick, 0);
        assert_eq!(step.observation, battery::LOW);
        assert_eq!(step.action, Some(battery::CHARGE));
        assert_eq!(agent.last_action(), Some(battery::CHARGE));
    }

    #[test]
    fn healthy_battery_idles() {
        let mut agent = battery_agent();
        let step = agent.step(Some(battery::OK)).expect("step");
        assert_eq!(step.action, Some(battery::IDLE));
    }

    #[test]
    fn history_grows_per_step() {
        let mut agent = battery_agent();
        for _ in 0..3 {
            agent.step(Some(battery::LOW)).expect("step");
        }
        assert_eq!(agent.history().len(), 3);
        assert_eq!(agent.history()[2].tick, 2);
        assert_eq!(agent.most_likely_state(), battery::LOW);
    }

    #[test]
    fn restored_parameter_seeds_the_prior() {
        let parameter = BeliefParameter {
            concentration: array![0.0, 0.0, 1.0],
            learning_rate: 0.5,
        };
        let agent = battery_agent().with_parameter(parameter).expect("valid");
        assert_eq!(agent.most_likely_state(), battery::CRITICAL);
        assert_eq!(agent.parameter().map(|p| p.learning_rate), Some(0.5));
    }

    #[test]
    fn mismatched_parameter_is_rejected() {
        let err = battery_agent()
            .with_parameter(BeliefParameter::uniform(2, 0.5))
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn out_of_range_observation_is_rejected() {
        let mut agent = battery_agent();
        assert!(matches!(
            agent.step(Some(7)),
            Err(Error::ObservationOutOfRange { observation: 7, .. })
        ));
        assert!(agent.history().is_empty());
    }

    #[test]
    fn preference_can_change_between_steps() {
        let mut agent = battery_agent();
        agent
            .set_preference(array![0.0, 0.0, 0.0].view())
            .expect("preference");
        // Without a preference the policy prior decides.
        let step = agent.step(Some(battery::LOW)).expect("step");
        assert_eq!(step.action, Some(battery::IDLE));
    }
}
