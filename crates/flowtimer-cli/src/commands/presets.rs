use clap::Subcommand;
use flowtimer_core::timer::presets;
use flowtimer_core::TimerDefinition;

use super::format_clock;

#[derive(Subcommand)]
pub enum PresetsAction {
    /// List built-in presets
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a preset definition as JSON
    Show {
        /// Preset id
        id: String,
    },
}

fn total(definition: &TimerDefinition) -> String {
    match definition.total_duration_secs() {
        Some(secs) => format_clock(secs),
        None => "∞".to_string(),
    }
}

pub fn run(action: PresetsAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        PresetsAction::List { json } => {
            let all = presets::all();
            if json {
                println!("{}", serde_json::to_string_pretty(&all)?);
                return Ok(());
            }
            println!("{:<16} {:<20} {:>5} {:>5} {:>8}", "ID", "NAME", "STEPS", "REPS", "TOTAL");
            for preset in &all {
                println!(
                    "{:<16} {:<20} {:>5} {:>5} {:>8}",
                    preset.id,
                    preset.name,
                    preset.step_count(),
                    preset.repetitions.to_string(),
                    total(preset),
                );
            }
        }
        PresetsAction::Show { id } => {
            let preset = presets::find(&id).ok_or_else(|| format!("unknown preset: {id}"))?;
            println!("{}", serde_json::to_string_pretty(&preset)?);
        }
    }
    Ok(())
}
