//! Initial-state belief and its learning update.
//!
//! Each episode starts from a working prior `D`. When a persistent
//! concentration parameter `d` exists, the Bayesian-averaged time-0 belief of
//! a finished episode is folded into `d` with weight `kappa_d`, and the
//! normalized result becomes the next episode's prior.

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    Error, Result,
    model::GenerativeModel,
    numeric::{argmax, normalize_vector},
};

/// Persistent Dirichlet-like parameter `d` and its learning rate `kappa_d`.
///
/// This is the only state expected to survive between engine invocations;
/// see [`crate::ports::PriorRepository`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeliefParameter {
    pub concentration: Array1<f64>,
    pub learning_rate: f64,
}

impl BeliefParameter {
    /// Uniform parameter over `n_states`.
    pub fn uniform(n_states: usize, learning_rate: f64) -> Self {
        Self {
            concentration: Array1::from_elem(n_states, 1.0 / n_states as f64),
            learning_rate,
        }
    }

    pub fn validate(&self, n_states: usize) -> Result<()> {
        if self.concentration.len() != n_states {
            return Err(Error::DimensionMismatch {
                what: "initial belief parameter".to_string(),
                expected: n_states,
                got: self.concentration.len(),
            });
        }
        if !self.learning_rate.is_finite() || !(0.0..=1.0).contains(&self.learning_rate) {
            return Err(Error::InvalidLearningRate {
                value: self.learning_rate,
            });
        }
        if self.concentration.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidConfiguration {
                message: "initial belief parameter contains non-finite entries".to_string(),
            });
        }
        Ok(())
    }
}

/// The prior over hidden states that seeds an episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorBelief {
    belief: Array1<f64>,
    parameter: Option<BeliefParameter>,
}

/// Result of the end-of-episode learning step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningOutcome {
    /// Prior for the next episode
    pub belief: Array1<f64>,
    /// Most likely hidden state under that prior
    pub most_likely_state: usize,
    /// Whether a persistent parameter absorbed this episode's marginal
    pub learned: bool,
}

impl PriorBelief {
    /// Working prior without a learnable parameter.
    pub fn fixed(belief: ArrayView1<'_, f64>) -> Self {
        Self {
            belief: normalize_vector(&belief),
            parameter: None,
        }
    }

    /// Prior driven by a persistent parameter; the working belief is `normalize(d)`.
    pub fn learnable(mut parameter: BeliefParameter) -> Self {
        parameter.concentration = normalize_vector(&parameter.concentration);
        Self {
            belief: parameter.concentration.clone(),
            parameter: Some(parameter),
        }
    }

    /// Derive the prior from a model: `d` wins over `D`, which wins over uniform.
    pub fn from_model(model: &GenerativeModel, n_states: usize) -> Result<Self> {
        match (&model.initial_belief_parameter, &model.initial_belief) {
            (Some(concentration), _) => {
                let parameter = BeliefParameter {
                    concentration: concentration.clone(),
                    learning_rate: model.learning_rate,
                };
                parameter.validate(n_states)?;
                Ok(Self::learnable(parameter))
            }
            (None, Some(belief)) => Ok(Self::fixed(belief.view())),
            (None, None) => Ok(Self::fixed(Array1::ones(n_states).view())),
        }
    }

    /// Working prior `D`; always sums to one.
    pub fn belief(&self) -> ArrayView1<'_, f64> {
        self.belief.view()
    }

    pub fn parameter(&self) -> Option<&BeliefParameter> {
        self.parameter.as_ref()
    }

    pub fn most_likely_state(&self) -> usize {
        argmax(&self.belief)
    }

    /// Fold an episode's averaged time-0 belief into the parameter.
    ///
    /// `d ← normalize(d + kappa_d·marginal)`. `kappa_d = 0` leaves `d`
    /// untouched; larger rates pull it further towards the marginal, which it
    /// only equals when `d` is already proportional to it.
    /// Without a parameter the prior is left as is.
    pub fn update(&mut self, marginal: ArrayView1<'_, f64>) -> LearningOutcome {
        let learned = match &mut self.parameter {
            Some(parameter) => {
                let kappa = parameter.learning_rate;
                let concentration = &parameter.concentration + &marginal.mapv(|m| kappa * m);
                parameter.concentration = normalize_vector(&concentration);
                self.belief = parameter.concentration.clone();
                true
            }
            None => false,
        };

        let most_likely_state = self.most_likely_state();
        if learned {
            info!(
                most_likely_state,
                belief = ?self.belief.to_vec(),
                "updated initial-state belief"
            );
        }

        LearningOutcome {
            belief: self.belief.clone(),
            most_likely_state,
            learned,
        }
    }
}
