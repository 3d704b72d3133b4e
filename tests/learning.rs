//! Learning-rate extremes of the initial-state update.

use aip::{BeliefParameter, Engine, EngineConfig, EpisodeInputs, models::battery, numeric};
use ndarray::array;

fn engine() -> Engine {
    Engine::new(&battery::model(), EngineConfig::default()).expect("engine")
}

#[test]
fn zero_learning_rate_leaves_the_parameter_unchanged() {
    let engine = engine();
    let parameter = BeliefParameter {
        concentration: array![0.5, 0.3, 0.2],
        learning_rate: 0.0,
    };
    let mut prior = aip::PriorBelief::learnable(parameter.clone());

    for reading in [battery::LOW, battery::CRITICAL, battery::LOW] {
        engine
            .run_episode(&mut prior, EpisodeInputs::first_observation(reading))
            .expect("episode");
    }

    let learned = prior.parameter().expect("parameter");
    for (got, want) in learned.concentration.iter().zip(parameter.concentration.iter()) {
        assert!((got - want).abs() < 1e-12, "{got} != {want}");
    }
    assert_eq!(prior.most_likely_state(), battery::OK);
}

#[test]
fn unit_learning_rate_adds_the_averaged_marginal() {
    let engine = engine();
    let mut prior = aip::PriorBelief::learnable(BeliefParameter::uniform(3, 1.0));
    let before = prior.belief().to_owned();

    let report = engine
        .run_episode(&mut prior, EpisodeInputs::first_observation(battery::CRITICAL))
        .expect("episode");

    let expected = numeric::normalize_vector(&(&before + &report.marginal.column(0)));
    let learned = prior.parameter().expect("parameter");
    for (got, want) in learned.concentration.iter().zip(expected.iter()) {
        assert!((got - want).abs() < 1e-12, "{got} != {want}");
    }
    // Half uniform, half the (critical) marginal.
    assert!(learned.concentration[battery::CRITICAL] > 0.66);
    assert_eq!(report.learning.most_likely_state, battery::CRITICAL);
    assert!(report.learning.learned);
}

#[test]
fn parameter_matching_the_marginal_is_unchanged() {
    let engine = engine();
    let mut prior = aip::PriorBelief::learnable(BeliefParameter::uniform(3, 1.0));
    let report = engine
        .run_episode(&mut prior, EpisodeInputs::first_observation(battery::LOW))
        .expect("episode");
    let marginal = numeric::normalize_vector(&report.marginal.column(0));

    let mut matched = aip::PriorBelief::learnable(BeliefParameter {
        concentration: marginal.clone(),
        learning_rate: 1.0,
    });
    matched.update(marginal.view());
    for (got, want) in matched.belief().iter().zip(marginal.iter()) {
        assert!((got - want).abs() < 1e-12, "{got} != {want}");
    }
}

#[test]
fn fixed_prior_never_learns() {
    let model = battery::model();
    let mut fixed = model.clone();
    fixed.initial_belief_parameter = None;
    fixed.initial_belief = Some(array![0.25, 0.5, 0.25]);

    let engine = Engine::new(&fixed, EngineConfig::default()).expect("engine");
    let mut prior = engine.initial_prior();
    let report = engine
        .run_episode(&mut prior, EpisodeInputs::first_observation(battery::OK))
        .expect("episode");

    assert!(!report.learning.learned);
    assert!(prior.parameter().is_none());
    assert_eq!(prior.belief().to_vec(), vec![0.25, 0.5, 0.25]);
}
