//! Persisting the learned prior between agent runs.

use aip::{
    Agent, EngineConfig,
    adapters::{InMemoryPriorRepository, JsonPriorRepository, MsgPackPriorRepository},
    models::battery,
    ports::PriorRepository,
};
use std::path::Path;
use tempfile::TempDir;

fn trained_agent() -> Agent {
    let mut agent = Agent::new(&battery::model(), EngineConfig::default()).expect("agent");
    for _ in 0..6 {
        agent.step(Some(battery::LOW)).expect("step");
    }
    agent
}

fn resume_from<R: PriorRepository>(repo: &R, path: &Path) {
    let agent = trained_agent();
    let parameter = agent.parameter().expect("battery prior is learnable");
    repo.save(parameter, path).expect("save");

    let loaded = repo.load(path).expect("load");
    assert_eq!(loaded.learning_rate, parameter.learning_rate);
    assert_close(loaded.concentration.iter(), parameter.concentration.iter());

    let resumed = Agent::new(&battery::model(), EngineConfig::default())
        .expect("agent")
        .with_parameter(loaded)
        .expect("valid parameter");
    assert_eq!(resumed.most_likely_state(), battery::LOW);
    assert_close(resumed.current_belief().iter(), agent.current_belief().iter());
}

fn assert_close<'a>(got: impl Iterator<Item = &'a f64>, want: impl Iterator<Item = &'a f64>) {
    for (g, w) in got.zip(want) {
        assert!((g - w).abs() < 1e-12, "{g} != {w}");
    }
}

#[test]
fn json_prior_resumes_learning() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    resume_from(&JsonPriorRepository::new(), &temp_dir.path().join("prior.json"));
}

#[test]
fn msgpack_prior_resumes_learning() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    resume_from(
        &MsgPackPriorRepository::new(),
        &temp_dir.path().join("prior.msgpack"),
    );
}

#[test]
fn in_memory_prior_resumes_learning() {
    let repo = InMemoryPriorRepository::new();
    resume_from(&repo, Path::new("battery"));
    assert_eq!(repo.count(), 1);
}
