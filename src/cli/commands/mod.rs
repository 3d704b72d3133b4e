//! Subcommands of the `aip` binary.

pub mod battery;
pub mod run;
pub mod template;
