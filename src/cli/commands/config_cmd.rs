//! `roadmapper config`

use anyhow::Result;

use crate::{Config, ExitCode, StoreLock};

/// Print effective configuration values with their sources.
pub fn execute_config_command(config: &Config) -> Result<ExitCode> {
    println!("Effective configuration:");
    for (key, (value, source)) in config.effective_config() {
        println!("  {key:<22} = {value:<40} [{source}]");
    }

    // Diagnostic only; a stale or unreadable lock file is not an error here
    let store_dir = config.store_dir();
    if let Ok(Some(holder)) = StoreLock::holder(&store_dir) {
        println!(
            "\nLast store lock holder: pid {} at {} (roadmapper {})",
            holder.pid, holder.acquired_at, holder.version
        );
    }
    Ok(ExitCode::SUCCESS)
}
