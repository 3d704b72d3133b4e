//! Discrete active-inference engine
//!
//! This crate provides:
//! - Variational state estimation over a finite policy set
//! - Policy selection by expected free energy and policy priors
//! - Learning of the initial-state belief across episodes
//! - A stateful agent wrapper with pluggable prior persistence
//! - A battery reference model and a small CLI

pub mod adapters;
pub mod agent;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod model;
pub mod models;
pub mod numeric;
pub mod ports;
pub mod sampling;

pub use agent::{Agent, AgentStep};
pub use config::EngineConfig;
pub use engine::{
    BeliefParameter, Engine, Episode, EpisodeInputs, EpisodeReport, PolicySelection, PriorBelief,
    StateInference,
};
pub use error::{Error, Result};
pub use model::{GenerativeModel, ModelDimensions, ModelLabels};
pub use sampling::{ArgMaxSampler, Sampler, SamplingStrategy, WeightedSampler};
