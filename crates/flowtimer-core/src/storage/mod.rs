mod config;

pub use config::{Config, NotificationsConfig, TickerConfig, UiConfig, MAX_RECENT_TIMERS};

use std::path::PathBuf;

/// Returns `~/.config/flowtimer[-dev]/` based on FLOWTIMER_ENV.
///
/// Set FLOWTIMER_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FLOWTIMER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("flowtimer-dev")
    } else {
        base_dir.join("flowtimer")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
