//! Error types for the active-inference engine

use thiserror::Error;

/// Main error type for the `aip` crate
///
/// Configuration variants are raised while the generative model is normalized
/// and are never recovered. Numeric edge cases (zero-sum columns, logarithms
/// of zero) are absorbed inside [`crate::numeric`] and do not appear here.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("dimension mismatch in {what}: expected {expected}, got {got}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        got: usize,
    },

    #[error("{what} must not be empty")]
    EmptyDimension { what: String },

    #[error(
        "policy {policy} selects action {action} at step {step}, but only {n_actions} actions exist"
    )]
    InvalidPolicyAction {
        policy: usize,
        step: usize,
        action: usize,
        n_actions: usize,
    },

    #[error("learning rate {value} must be finite and lie in [0, 1]")]
    InvalidLearningRate { value: f64 },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("observation {observation} is out of range (model has {n_outcomes} outcomes)")]
    ObservationOutOfRange {
        observation: usize,
        n_outcomes: usize,
    },

    #[error("hidden state {state} is out of range (model has {n_states} states)")]
    HiddenStateOutOfRange { state: usize, n_states: usize },

    #[error("episode already processed all {horizon} ticks of its horizon")]
    EpisodeComplete { horizon: usize },

    /// `tick` is the episode's current tick, not the one the caller asked for.
    #[error("tick {tick} is out of order: {message}")]
    TickOrder { tick: usize, message: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to {operation}: {message}")]
    SerializationContext { operation: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for errors raised while validating a generative model or engine configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::DimensionMismatch { .. }
                | Error::EmptyDimension { .. }
                | Error::InvalidPolicyAction { .. }
                | Error::InvalidLearningRate { .. }
                | Error::InvalidConfiguration { .. }
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}
