//! CLI infrastructure for the `aip` binary
//!
//! Runs the agent over observation sequences, replays the battery scenario
//! and prints model templates.

pub mod commands;
pub mod logging;
pub mod output;
