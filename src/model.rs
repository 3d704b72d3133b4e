//! Raw generative model supplied by the model-definition collaborator.
//!
//! The engine never builds these matrices itself. It validates their shapes
//! here and derives the working (normalized, log-domain) forms in
//! [`crate::engine::NormalizedModel`].

use std::{fs::File, io::BufReader, path::Path};

use ndarray::{Array1, Array2, Array3, ArrayBase, Data, Dimension};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Partially observable Markov model with an enumerated policy set.
///
/// # Shapes
///
/// | field | shape |
/// |-------|-------|
/// | `likelihood` (A) | outcomes × states |
/// | `transition` (B) | states × states × actions, `B[next, current, action]` |
/// | `preference` (C) | outcomes |
/// | `policy_prior` (E) | policies |
/// | `policy_set` (V) | policies × (horizon − 1) |
/// | `initial_belief` (D) | states |
/// | `initial_belief_parameter` (d) | states |
///
/// The horizon length is one more than the number of policy columns: the
/// last horizon position has no outgoing action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerativeModel {
    pub likelihood: Array2<f64>,
    pub transition: Array3<f64>,
    pub preference: Array1<f64>,
    pub policy_prior: Array1<f64>,
    pub policy_set: Array2<usize>,
    #[serde(default)]
    pub initial_belief: Option<Array1<f64>>,
    #[serde(default)]
    pub initial_belief_parameter: Option<Array1<f64>>,
    /// Learning rate `kappa_d` in `[0, 1]`
    #[serde(default)]
    pub learning_rate: f64,
    #[serde(default)]
    pub labels: ModelLabels,
}

/// Optional human-readable names for states, outcomes and actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelLabels {
    #[serde(default)]
    pub states: Vec<String>,
    #[serde(default)]
    pub outcomes: Vec<String>,
    #[serde(default)]
    pub actions: Vec<String>,
}

impl ModelLabels {
    pub fn state(&self, index: usize) -> String {
        label_or_index(&self.states, index)
    }

    pub fn outcome(&self, index: usize) -> String {
        label_or_index(&self.outcomes, index)
    }

    pub fn action(&self, index: usize) -> String {
        label_or_index(&self.actions, index)
    }
}

fn label_or_index(labels: &[String], index: usize) -> String {
    labels
        .get(index)
        .cloned()
        .unwrap_or_else(|| index.to_string())
}

/// Dimensions derived from (and cross-checked against) a [`GenerativeModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDimensions {
    pub n_states: usize,
    pub n_outcomes: usize,
    pub n_actions: usize,
    pub n_policies: usize,
    pub horizon: usize,
}

impl GenerativeModel {
    /// Create a model without an initial belief, belief parameter or labels.
    pub fn new(
        likelihood: Array2<f64>,
        transition: Array3<f64>,
        preference: Array1<f64>,
        policy_prior: Array1<f64>,
        policy_set: Array2<usize>,
    ) -> Self {
        Self {
            likelihood,
            transition,
            preference,
            policy_prior,
            policy_set,
            initial_belief: None,
            initial_belief_parameter: None,
            learning_rate: 0.0,
            labels: ModelLabels::default(),
        }
    }

    /// Set the working prior `D`.
    pub fn with_initial_belief(mut self, belief: Array1<f64>) -> Self {
        self.initial_belief = Some(belief);
        self
    }

    /// Set the persistent belief parameter `d` and its learning rate.
    pub fn with_belief_parameter(mut self, parameter: Array1<f64>, learning_rate: f64) -> Self {
        self.initial_belief_parameter = Some(parameter);
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_labels(mut self, labels: ModelLabels) -> Self {
        self.labels = labels;
        self
    }

    /// Validate every shape invariant and return the derived dimensions.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when any field disagrees with the state,
    /// outcome, action or policy counts, when a policy names an action that
    /// does not exist, when an entry is non-finite, or when the learning rate
    /// lies outside `[0, 1]`.
    pub fn dimensions(&self) -> Result<ModelDimensions> {
        let (n_outcomes, n_states) = self.likelihood.dim();
        ensure_non_empty("likelihood outcomes", n_outcomes)?;
        ensure_non_empty("likelihood states", n_states)?;

        let (next_states, current_states, n_actions) = self.transition.dim();
        ensure_dim("transition rows (next state)", n_states, next_states)?;
        ensure_dim("transition columns (current state)", n_states, current_states)?;
        ensure_non_empty("transition actions", n_actions)?;

        ensure_dim("preference", n_outcomes, self.preference.len())?;

        let (n_policies, steps) = self.policy_set.dim();
        ensure_non_empty("policy set", n_policies)?;
        ensure_dim("policy prior", n_policies, self.policy_prior.len())?;

        for ((policy, step), &action) in self.policy_set.indexed_iter() {
            if action >= n_actions {
                return Err(Error::InvalidPolicyAction {
                    policy,
                    step,
                    action,
                    n_actions,
                });
            }
        }

        if let Some(belief) = &self.initial_belief {
            ensure_dim("initial belief", n_states, belief.len())?;
        }
        if let Some(parameter) = &self.initial_belief_parameter {
            ensure_dim("initial belief parameter", n_states, parameter.len())?;
        }

        ensure_finite("likelihood", &self.likelihood)?;
        ensure_finite("transition", &self.transition)?;
        ensure_finite("preference", &self.preference)?;
        ensure_finite("policy prior", &self.policy_prior)?;
        if let Some(belief) = &self.initial_belief {
            ensure_finite("initial belief", belief)?;
        }
        if let Some(parameter) = &self.initial_belief_parameter {
            ensure_finite("initial belief parameter", parameter)?;
        }

        if !self.learning_rate.is_finite() || !(0.0..=1.0).contains(&self.learning_rate) {
            return Err(Error::InvalidLearningRate {
                value: self.learning_rate,
            });
        }

        ensure_labels("state labels", n_states, &self.labels.states)?;
        ensure_labels("outcome labels", n_outcomes, &self.labels.outcomes)?;
        ensure_labels("action labels", n_actions, &self.labels.actions)?;

        Ok(ModelDimensions {
            n_states,
            n_outcomes,
            n_actions,
            n_policies,
            horizon: steps + 1,
        })
    }

    /// Parse a model from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a model from a JSON file. Shapes are not validated until the
    /// model is normalized.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open model {path:?}"),
            source,
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn ensure_non_empty(what: &str, len: usize) -> Result<()> {
    if len == 0 {
        return Err(Error::EmptyDimension {
            what: what.to_string(),
        });
    }
    Ok(())
}

fn ensure_dim(what: &str, expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(Error::DimensionMismatch {
            what: what.to_string(),
            expected,
            got,
        });
    }
    Ok(())
}

fn ensure_finite<S, D>(what: &str, values: &ArrayBase<S, D>) -> Result<()>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(Error::InvalidConfiguration {
            message: format!("{what} contains non-finite entries"),
        })
    }
}

fn ensure_labels(what: &str, expected: usize, labels: &[String]) -> Result<()> {
    if labels.is_empty() {
        return Ok(());
    }
    ensure_dim(what, expected, labels.len())
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, Array3, array};

    use super::*;

    fn two_state_model() -> GenerativeModel {
        let mut transition = Array3::zeros((2, 2, 2));
        transition
            .index_axis_mut(ndarray::Axis(2), 0)
            .assign(&Array2::eye(2));
        transition
            .index_axis_mut(ndarray::Axis(2), 1)
            .assign(&array![[0.0, 1.0], [1.0, 0.0]]);
        GenerativeModel::new(
            Array2::eye(2),
            transition,
            array![1.0, 0.0],
            array![0.5, 0.5],
            array![[0], [1]],
        )
    }

    #[test]
    fn dimensions_are_derived() {
        let dims = two_state_model().dimensions().expect("valid model");
        assert_eq!(
            dims,
            ModelDimensions {
                n_states: 2,
                n_outcomes: 2,
                n_actions: 2,
                n_policies: 2,
                horizon: 2,
            }
        );
    }

    #[test]
    fn preference_length_mismatch_is_rejected() {
        let mut model = two_state_model();
        model.preference = array![1.0, 0.0, 0.0];
        match model.dimensions() {
            Err(Error::DimensionMismatch { what, expected, got }) => {
                assert_eq!(what, "preference");
                assert_eq!((expected, got), (2, 3));
            }
            other => panic!("expected dimension mismatch, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_policy_action_is_rejected() {
        let mut model = two_state_model();
        model.policy_set = array![[0], [2]];
        assert!(matches!(
            model.dimensions(),
            Err(Error::InvalidPolicyAction {
                policy: 1,
                step: 0,
                action: 2,
                n_actions: 2
            })
        ));
    }

    #[test]
    fn learning_rate_outside_unit_interval_is_rejected() {
        let model = two_state_model().with_belief_parameter(array![1.0, 1.0], 1.5);
        let err = model.dimensions().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn non_finite_entries_are_rejected() {
        let mut model = two_state_model();
        model.likelihood[[0, 0]] = f64::NAN;
        assert!(model.dimensions().is_err());
    }

    #[test]
    fn json_round_trip_preserves_model() {
        let model = two_state_model().with_initial_belief(array![0.9, 0.1]);
        let json = model.to_json_pretty().expect("serialize");
        let parsed = GenerativeModel::from_json_str(&json).expect("parse");
        assert_eq!(parsed, model);
    }
}
