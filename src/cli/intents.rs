use anyhow::{Context, Result};
use clap::Args;

use super::context::CliContext;
use super::output::OutputFormat;

#[derive(Args, Clone, Debug)]
pub struct IntentsArgs {
    /// Print as YAML, in the format accepted by `intents_path`
    #[arg(long)]
    pub yaml: bool,
}

pub fn cmd_intents(args: IntentsArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let table = ctx.intents()?;
    if args.yaml {
        print!("{}", table.to_yaml().context("Failed to render intents")?);
        return Ok(());
    }
    match output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&table.to_json())
                .context("Failed to render intents")?;
            println!("{}", json);
        }
        OutputFormat::Human => {
            println!("{:<26} {:>5} {:>8}  first candidate", "intent", "cands", "timeout");
            for (intent, recipe) in table.iter() {
                let first = recipe
                    .candidates
                    .iter()
                    .next()
                    .map(|c| c.to_string())
                    .unwrap_or_default();
                println!(
                    "{:<26} {:>5} {:>6}ms  {}",
                    intent.as_str(),
                    recipe.candidates.len(),
                    recipe.options.timeout_ms,
                    first
                );
            }
        }
    }
    Ok(())
}
