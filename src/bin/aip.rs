//! aip CLI - discrete active-inference agent
//!
//! This CLI provides:
//! - Running an agent over an observation sequence with a persisted prior
//! - The battery internal-requirement scenario
//! - A model template to start new models from

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "aip")]
#[command(version, about = "Discrete active-inference agent", long_about = None)]
struct Cli {
    /// Log per-tick inference details to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agent over an observation sequence
    Run(aip::cli::commands::run::RunArgs),

    /// Run the battery scenario
    Battery(aip::cli::commands::battery::BatteryArgs),

    /// Print the battery model as a JSON template
    Template(aip::cli::commands::template::TemplateArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    aip::cli::logging::init_logging(cli.verbose);

    match cli.command {
        Commands::Run(args) => aip::cli::commands::run::execute(args),
        Commands::Battery(args) => aip::cli::commands::battery::execute(args),
        Commands::Template(args) => aip::cli::commands::template::execute(args),
    }
}
