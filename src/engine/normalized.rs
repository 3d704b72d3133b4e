//! Working forms of the generative model.
//!
//! Built once per engine: column-normalized likelihood and transitions, their
//! log-domain forms, the backward (transposed) transitions, the log-softmaxed
//! preference and the log-normalized policy prior.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use tracing::warn;

use crate::{
    Error, Result,
    engine::learning::PriorBelief,
    model::{GenerativeModel, ModelDimensions, ModelLabels},
    numeric::{log_softmax, normalize_columns_in_place, normalize_vector, safe_log},
};

#[derive(Debug, Clone)]
pub struct NormalizedModel {
    dims: ModelDimensions,
    likelihood: Array2<f64>,
    ln_likelihood: Array2<f64>,
    forward: Vec<Array2<f64>>,
    ln_forward: Vec<Array2<f64>>,
    ln_backward: Vec<Array2<f64>>,
    ln_preference: Array1<f64>,
    ln_policy_prior: Array1<f64>,
    policy_set: Array2<usize>,
    initial_prior: PriorBelief,
    labels: ModelLabels,
}

impl NormalizedModel {
    /// Validate `model` and derive every working matrix.
    ///
    /// # Errors
    ///
    /// Any shape or range violation reported by
    /// [`GenerativeModel::dimensions`].
    pub fn new(model: &GenerativeModel) -> Result<Self> {
        let dims = model.dimensions()?;

        let initial_prior = PriorBelief::from_model(model, dims.n_states)?;

        let ln_preference = log_softmax(&model.preference);
        let ln_policy_prior = safe_log(&normalize_vector(&model.policy_prior));

        let mut likelihood = model.likelihood.clone();
        let degenerate = normalize_columns_in_place(&mut likelihood);
        if degenerate > 0 {
            warn!(
                columns = degenerate,
                "likelihood has zero-sum columns; using uniform outcome distributions"
            );
        }
        let ln_likelihood = safe_log(&likelihood);

        let mut forward = Vec::with_capacity(dims.n_actions);
        let mut ln_forward = Vec::with_capacity(dims.n_actions);
        let mut ln_backward = Vec::with_capacity(dims.n_actions);
        for (action, slice) in model.transition.axis_iter(Axis(2)).enumerate() {
            let mut transition = slice.to_owned();
            let degenerate = normalize_columns_in_place(&mut transition);
            if degenerate > 0 {
                warn!(
                    action,
                    columns = degenerate,
                    "transition has zero-sum columns; using uniform next-state distributions"
                );
            }
            let ln_transition = safe_log(&transition);
            ln_backward.push(ln_transition.t().to_owned());
            ln_forward.push(ln_transition);
            forward.push(transition);
        }

        Ok(Self {
            dims,
            likelihood,
            ln_likelihood,
            forward,
            ln_forward,
            ln_backward,
            ln_preference,
            ln_policy_prior,
            policy_set: model.policy_set.clone(),
            initial_prior,
            labels: model.labels.clone(),
        })
    }

    pub fn dims(&self) -> ModelDimensions {
        self.dims
    }

    pub fn horizon(&self) -> usize {
        self.dims.horizon
    }

    pub fn labels(&self) -> &ModelLabels {
        &self.labels
    }

    /// Column-normalized likelihood `A` (outcomes × states).
    pub fn likelihood(&self) -> ArrayView2<'_, f64> {
        self.likelihood.view()
    }

    pub fn ln_likelihood(&self) -> ArrayView2<'_, f64> {
        self.ln_likelihood.view()
    }

    /// Column-normalized transition `B[:, :, action]`.
    pub fn forward(&self, action: usize) -> ArrayView2<'_, f64> {
        self.forward[action].view()
    }

    pub fn ln_forward(&self, action: usize) -> ArrayView2<'_, f64> {
        self.ln_forward[action].view()
    }

    /// Log of the transposed transition, used for backward messages.
    pub fn ln_backward(&self, action: usize) -> ArrayView2<'_, f64> {
        self.ln_backward[action].view()
    }

    /// `lnC`: log-softmax of the raw preference.
    pub fn ln_preference(&self) -> ArrayView1<'_, f64> {
        self.ln_preference.view()
    }

    /// `lnE`: log of the normalized policy prior.
    pub fn ln_policy_prior(&self) -> ArrayView1<'_, f64> {
        self.ln_policy_prior.view()
    }

    /// Action sequence of `policy`, one entry per horizon step except the last.
    pub fn policy_actions(&self, policy: usize) -> ArrayView1<'_, usize> {
        self.policy_set.row(policy)
    }

    pub fn policy_set(&self) -> ArrayView2<'_, usize> {
        self.policy_set.view()
    }

    /// Working prior (and optional learnable parameter) derived at construction.
    pub fn initial_prior(&self) -> &PriorBelief {
        &self.initial_prior
    }

    /// Replace the raw preference vector and recompute `lnC`.
    pub fn set_preference(&mut self, preference: ArrayView1<'_, f64>) -> Result<()> {
        if preference.len() != self.dims.n_outcomes {
            return Err(Error::DimensionMismatch {
                what: "preference".to_string(),
                expected: self.dims.n_outcomes,
                got: preference.len(),
            });
        }
        if preference.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidConfiguration {
                message: "preference contains non-finite entries".to_string(),
            });
        }
        self.ln_preference = log_softmax(&preference);
        Ok(())
    }
}
