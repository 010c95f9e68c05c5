pub mod config;
pub mod presets;
pub mod run;
pub mod validate;

use std::path::Path;

use flowtimer_core::TimerDefinition;

/// `m:ss` for a number of seconds.
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Read a JSON timer definition from disk. Does not validate it.
pub fn read_definition(path: &Path) -> Result<TimerDefinition, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let definition = serde_json::from_str(&content)
        .map_err(|e| format!("cannot parse {}: {e}", path.display()))?;
    Ok(definition)
}
