//! Run command - drive the agent over an observation sequence

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    adapters::{JsonPriorRepository, MsgPackPriorRepository},
    agent::Agent,
    cli::output,
    config::EngineConfig,
    export::StepCsvExporter,
    model::GenerativeModel,
    ports::PriorRepository,
    sampling::SamplingStrategy,
};

#[derive(Parser, Debug)]
#[command(about = "Run the agent over an observation sequence")]
pub struct RunArgs {
    /// Generative model JSON file
    #[arg(long, short = 'm')]
    pub model: PathBuf,

    /// Comma-separated observation indices, one per tick
    #[arg(long, short = 'o', value_delimiter = ',', required = true)]
    pub observations: Vec<usize>,

    /// Learned prior file (`.json` or `.msgpack`); loaded when present and
    /// saved after the run
    #[arg(long)]
    pub prior: Option<PathBuf>,

    /// Engine configuration JSON file
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Seed for weighted sampling (overrides the configured strategy)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the per-tick trace as CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

/// Pick the repository matching a prior file's extension.
pub fn prior_repository(path: &Path) -> Box<dyn PriorRepository> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("msgpack") | Some("mp") => Box::new(MsgPackPriorRepository::new()),
        _ => Box::new(JsonPriorRepository::new()),
    }
}

pub fn execute(args: RunArgs) -> Result<()> {
    let model = GenerativeModel::from_json_file(&args.model)
        .with_context(|| format!("loading model from {}", args.model.display()))?;

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_sampling(SamplingStrategy::Weighted { seed: Some(seed) });
    }

    let mut agent = Agent::new(&model, config).context("building agent")?;

    if let Some(path) = args.prior.as_deref().filter(|path| path.exists()) {
        let parameter = prior_repository(path)
            .load(path)
            .with_context(|| format!("loading prior from {}", path.display()))?;
        agent = agent.with_parameter(parameter)?;
        println!("Loaded prior from {}", path.display());
    }

    let labels = agent.engine().model().labels().clone();

    output::print_section("Active inference run");
    output::print_kv("model", &args.model.display().to_string());
    output::print_kv("ticks", &args.observations.len().to_string());
    output::print_kv("iterations", &agent.engine().config().iterations.to_string());

    output::print_subsection("Trace");
    output::print_step_header();
    for &observation in &args.observations {
        let step = agent
            .step(Some(observation))
            .with_context(|| format!("tick with observation {observation}"))?;
        output::print_step(&step, &labels);
    }

    output::print_subsection("Final belief");
    output::print_kv(
        "belief",
        &output::format_distribution(agent.current_belief(), |i| labels.state(i)),
    );
    output::print_kv("most likely", &labels.state(agent.most_likely_state()));

    if let Some(path) = &args.prior {
        match agent.parameter() {
            Some(parameter) => {
                prior_repository(path)
                    .save(parameter, path)
                    .with_context(|| format!("saving prior to {}", path.display()))?;
                println!("\n✓ Prior saved to: {}", path.display());
            }
            None => println!("\nModel has no learnable prior; nothing saved"),
        }
    }

    if let Some(path) = &args.csv {
        let rows = StepCsvExporter::export(agent.history(), &labels, path)
            .with_context(|| format!("writing trace to {}", path.display()))?;
        println!("✓ {rows} ticks exported to: {}", path.display());
    }

    Ok(())
}
