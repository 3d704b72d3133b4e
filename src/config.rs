//! Engine configuration.

use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, sampling::SamplingStrategy};

/// Number of variational sweeps per policy and tick.
///
/// There is no convergence test; every tick runs exactly this many sweeps.
pub const DEFAULT_ITERATIONS: usize = 4;

/// Configuration for the inference engine.
///
/// # Examples
///
/// ```
/// use aip::config::EngineConfig;
/// use aip::sampling::SamplingStrategy;
///
/// let config = EngineConfig::new()
///     .with_iterations(8)
///     .with_sampling(SamplingStrategy::Weighted { seed: Some(42) });
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Variational message-passing sweeps per policy per tick
    pub iterations: usize,
    /// How unobserved outcomes, unresolved states and actions are picked
    pub sampling: SamplingStrategy,
}

impl EngineConfig {
    /// Defaults: four sweeps and deterministic arg-max sampling.
    pub fn new() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            sampling: SamplingStrategy::ArgMax,
        }
    }

    /// Set the number of variational sweeps.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the sampling strategy.
    pub fn with_sampling(mut self, sampling: SamplingStrategy) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(Error::InvalidConfiguration {
                message: "iterations must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Load and validate a configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open config {path:?}"),
            source,
        })?;
        let config: EngineConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
