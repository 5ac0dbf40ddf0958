use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::core::config::Config;
use crate::core::process;
use crate::core::tool_config;

/// Validate the configuration and the array files without running SnapRAID
pub fn execute(matches: &clap::ArgMatches) -> Result<()> {
    let (path, config) = super::load_config(matches)?;

    println!(
        "{} {}",
        "Configuration OK:".green().bold(),
        path.display().to_string().cyan()
    );
    println!();

    println!("{}", "Executables:".white().bold());
    let mut missing = report_binary("snapraid", &config.snapraid.binary);
    if config.notifications.email.enabled {
        missing |= report_binary("mail", &config.notifications.email.binary);
    }
    if config.spindown.enabled {
        missing |= report_binary("hdparm", &config.spindown.binary);
    }
    println!();

    println!("{}", "Array files:".white().bold());
    let files = tool_config::sanity_check(&config.snapraid.config)?;
    for file in files.all() {
        println!("  {} {}", "✓".green(), file.display());
    }
    println!();

    print_features(&config);

    if missing {
        anyhow::bail!("One or more configured executables could not be found");
    }

    println!("{}", "All checks passed.".green().bold());
    Ok(())
}

/// Print the resolution of one executable, returning `true` when it is missing
fn report_binary(label: &str, binary: &Path) -> bool {
    match process::resolve_binary(binary) {
        Some(resolved) => {
            println!("  {} {:<9} {}", "✓".green(), label, resolved.display());
            false
        }
        None => {
            println!(
                "  {} {:<9} {}",
                "✗".red(),
                label,
                format!("not found at {}", binary.display()).red()
            );
            true
        }
    }
}

fn print_features(config: &Config) {
    let state = |enabled: bool| {
        if enabled {
            "enabled".green()
        } else {
            "disabled".dimmed()
        }
    };

    let thresholds = config.snapraid.diff.thresholds;

    println!("{}", "Settings:".white().bold());
    println!("  Pre-hash       {}", state(config.snapraid.sync.pre_hash));
    println!(
        "  Auto re-sync   {} (max {} attempts)",
        state(config.snapraid.sync.auto_sync.enabled),
        config.snapraid.sync.auto_sync.max_attempts
    );
    println!(
        "  Thresholds     updated {}, removed {}",
        limit(thresholds.updated),
        limit(thresholds.removed)
    );
    println!(
        "  Scrub          {} ({}% older than {} days)",
        state(config.snapraid.scrub.enabled),
        config.snapraid.scrub.check_percent,
        config.snapraid.scrub.min_age
    );
    println!("  Email          {}", state(config.notifications.email.enabled));
    println!("  Discord        {}", state(config.notifications.discord.enabled));
    println!("  Spin-down      {}", state(config.spindown.enabled));
    println!();
}

fn limit(threshold: u64) -> String {
    if threshold == 0 {
        "unlimited".to_string()
    } else {
        threshold.to_string()
    }
}
