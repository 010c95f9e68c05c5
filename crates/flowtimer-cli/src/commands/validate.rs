use std::path::PathBuf;

use clap::Args;

use super::{format_clock, read_definition};

#[derive(Args)]
pub struct ValidateArgs {
    /// JSON timer definition file
    path: PathBuf,
}

pub fn run(args: ValidateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let definition = read_definition(&args.path)?;
    definition.validate()?;

    let total = match definition.total_duration_secs() {
        Some(secs) => format_clock(secs),
        None => "until stopped".to_string(),
    };
    println!(
        "ok: {} ({} steps, {} repetitions, {total})",
        definition.name,
        definition.step_count(),
        definition.repetitions,
    );
    Ok(())
}
