// Command handlers module
pub mod check;
pub mod run;
pub mod version;

// Re-exports for cleaner imports
pub use check::execute as check;
pub use run::execute as run;
pub use version::execute as version;

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::core::config::Config;

/// Resolve `--config` (or the default location) and load it
pub fn load_config(matches: &clap::ArgMatches) -> Result<(PathBuf, Config)> {
    let path = match matches.get_one::<PathBuf>("config") {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };

    let config = Config::load(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    Ok((path, config))
}
