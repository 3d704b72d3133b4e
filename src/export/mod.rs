//! Export functionality for analysis
//!
//! CSV export of per-tick agent traces.

mod step_csv;

pub use step_csv::{StepCsvExporter, StepRecord};
