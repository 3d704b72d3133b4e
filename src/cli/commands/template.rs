//! Template command - print a model definition to start from

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::models::battery;

#[derive(Parser, Debug)]
#[command(about = "Print the battery model as a JSON template")]
pub struct TemplateArgs {
    /// Write to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn execute(args: TemplateArgs) -> Result<()> {
    let json = battery::model().to_json_pretty()?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("writing template to {}", path.display()))?;
            println!("✓ Template written to: {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
