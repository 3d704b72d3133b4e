//! Battery internal-requirement model.
//!
//! Three battery levels `{ok, low, critical}` observed through an identity
//! likelihood, two actions `{idle, charge}` and a one-step look-ahead. Idling
//! keeps the level; charging raises it by one level. The agent prefers `ok`
//! and, all else equal, slightly prefers idling over charging.

use ndarray::{Array1, Array2, Array3, Axis, array};

use crate::model::{GenerativeModel, ModelLabels};

pub const OK: usize = 0;
pub const LOW: usize = 1;
pub const CRITICAL: usize = 2;

pub const IDLE: usize = 0;
pub const CHARGE: usize = 1;

pub const N_LEVELS: usize = 3;

/// Default learning rate for the initial-state parameter.
pub const LEARNING_RATE: f64 = 0.5;

/// The battery model with a uniform, learnable initial-state parameter.
pub fn model() -> GenerativeModel {
    let mut transition = Array3::zeros((N_LEVELS, N_LEVELS, 2));
    transition
        .index_axis_mut(Axis(2), IDLE)
        .assign(&Array2::eye(N_LEVELS));
    // Columns are the current level, rows the next one.
    transition.index_axis_mut(Axis(2), CHARGE).assign(&array![
        [1.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [0.0, 0.0, 0.0],
    ]);

    GenerativeModel::new(
        Array2::eye(N_LEVELS),
        transition,
        preference(),
        array![0.6, 0.4],
        array![[IDLE], [CHARGE]],
    )
    .with_belief_parameter(Array1::ones(N_LEVELS), LEARNING_RATE)
    .with_labels(ModelLabels {
        states: level_names(),
        outcomes: level_names(),
        actions: vec!["idle".to_string(), "charge".to_string()],
    })
}

/// Fixed preference for a healthy battery: `[1, 0, 0]` over `{ok, low, critical}`.
pub fn preference() -> Array1<f64> {
    array![1.0, 0.0, 0.0]
}

fn level_names() -> Vec<String> {
    ["ok", "low", "critical"]
        .iter()
        .map(|name| name.to_string())
        .collect()
}
