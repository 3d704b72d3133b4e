//! CSV export for agent traces
//!
//! One row per environment tick with the observation, chosen action, most
//! likely hidden state, the learned prior and the first-tick policy posterior.

use std::{io::Write, path::Path};

use serde::Serialize;

use crate::{Result, agent::AgentStep, error::Error, model::ModelLabels};

/// A single row in the trace export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub tick: usize,
    pub observation: String,
    pub action: Option<String>,
    pub most_likely_state: String,
    /// Prior over hidden states after learning, `;`-separated
    pub belief: String,
    /// Policy posterior at the first episode tick, `;`-separated
    pub policy_posterior: String,
    pub max_free_energy: f64,
    pub max_expected_free_energy: f64,
}

impl StepRecord {
    pub fn from_step(step: &AgentStep, labels: &ModelLabels) -> Self {
        Self {
            tick: step.tick,
            observation: labels.outcome(step.observation),
            action: step.action.map(|a| labels.action(a)),
            most_likely_state: labels.state(step.most_likely_state),
            belief: join(step.belief.iter()),
            policy_posterior: join(step.policy_posterior.iter()),
            max_free_energy: max(step.free_energy.iter()),
            max_expected_free_energy: max(step.expected_free_energy.iter()),
        }
    }
}

fn join<'a>(values: impl Iterator<Item = &'a f64>) -> String {
    values
        .map(|v| format!("{v:.6}"))
        .collect::<Vec<_>>()
        .join(";")
}

fn max<'a>(values: impl Iterator<Item = &'a f64>) -> f64 {
    values.copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Exporter for agent trace CSV files
pub struct StepCsvExporter;

impl StepCsvExporter {
    /// Write `steps` to `path`, returning the number of rows written.
    pub fn export(steps: &[AgentStep], labels: &ModelLabels, path: &Path) -> Result<usize> {
        let file = std::fs::File::create(path).map_err(|source| Error::Io {
            operation: format!("create file {path:?}"),
            source,
        })?;
        Self::write(steps, labels, file)
    }

    /// Write `steps` as CSV with a header row to any writer.
    pub fn write<W: Write>(steps: &[AgentStep], labels: &ModelLabels, writer: W) -> Result<usize> {
        let mut csv = csv::Writer::from_writer(writer);
        for step in steps {
            csv.serialize(StepRecord::from_step(step, labels))?;
        }
        csv.flush().map_err(|source| Error::Io {
            operation: "flush CSV writer".to_string(),
            source,
        })?;
        Ok(steps.len())
    }
}
