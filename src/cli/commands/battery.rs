//! Battery command - replay the battery internal-requirement scenario
//!
//! The agent first sees a run of `low` readings, then a run of `ok`
//! readings, and learns its initial-state belief along the way.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    agent::Agent, cli::output, config::EngineConfig, export::StepCsvExporter, models::battery,
};

#[derive(Parser, Debug)]
#[command(about = "Run the battery scenario")]
pub struct BatteryArgs {
    /// Ticks observing a low battery
    #[arg(long, default_value_t = 15)]
    pub low_ticks: usize,

    /// Ticks observing a healthy battery afterwards
    #[arg(long, default_value_t = 5)]
    pub ok_ticks: usize,

    /// Learning rate for the initial-state belief
    #[arg(long, default_value_t = battery::LEARNING_RATE)]
    pub learning_rate: f64,

    /// Write the per-tick trace as CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

pub fn execute(args: BatteryArgs) -> Result<()> {
    let model = battery::model().with_learning_rate(args.learning_rate);
    let mut agent = Agent::new(&model, EngineConfig::default()).context("building agent")?;
    let labels = model.labels.clone();

    output::print_section("Battery scenario");
    output::print_kv("low ticks", &args.low_ticks.to_string());
    output::print_kv("ok ticks", &args.ok_ticks.to_string());
    output::print_kv("learning rate", &args.learning_rate.to_string());

    output::print_subsection("Trace");
    output::print_step_header();
    let readings = std::iter::repeat_n(battery::LOW, args.low_ticks)
        .chain(std::iter::repeat_n(battery::OK, args.ok_ticks));
    for reading in readings {
        let step = agent.step(Some(reading))?;
        output::print_step(&step, &labels);
    }

    let charges = agent
        .history()
        .iter()
        .filter(|step| step.action == Some(battery::CHARGE))
        .count();

    output::print_subsection("Summary");
    output::print_kv("charge actions", &charges.to_string());
    output::print_kv(
        "final belief",
        &output::format_distribution(agent.current_belief(), |i| labels.state(i)),
    );

    if let Some(path) = &args.csv {
        let rows = StepCsvExporter::export(agent.history(), &labels, path)
            .with_context(|| format!("writing trace to {}", path.display()))?;
        println!("\n✓ {rows} ticks exported to: {}", path.display());
    }

    Ok(())
}
