mod config;
pub mod database;

pub use config::{FontSize, Language, Settings, ThemePalette};
pub use database::{Database, Slot};

use std::path::PathBuf;

/// Returns the data directory, creating it if needed.
///
/// `POMOFOCUS_HOME` overrides the location outright. Otherwise this is
/// `~/.config/pomofocus[-dev]/`, with `POMOFOCUS_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("POMOFOCUS_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("POMOFOCUS_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomofocus-dev")
            } else {
                base_dir.join("pomofocus")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
