use std::path::{Path, PathBuf};
use std::process::Command;

use crate::core::config::{SpinDownConfig, SpinDownDrives};
use crate::core::process;
use crate::core::tool_config::ArrayFiles;

/// Shell pipeline that maps `files` to their block devices with `df` and puts them on standby
pub fn spin_down_command(hdparm: &Path, files: &[&PathBuf]) -> String {
    let paths: Vec<String> = files
        .iter()
        .map(|path| shell_quote(&path.to_string_lossy()))
        .collect();

    format!(
        "{} -y $(df {} | tail -n +2 | cut -d \" \" -f1 | tr \"\\n\" \" \")",
        shell_quote(&hdparm.to_string_lossy()),
        paths.join(" ")
    )
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Files whose drives are spun down for the configured selection
pub fn selected_files(files: &ArrayFiles, drives: SpinDownDrives) -> Vec<&PathBuf> {
    match drives {
        SpinDownDrives::Parity => files.parity.iter().collect(),
        SpinDownDrives::All => files.parity.iter().chain(files.content.iter()).collect(),
    }
}

/// Put the array drives on standby. Failures are logged and never fail the run.
pub fn spin_down(config: &SpinDownConfig, files: &ArrayFiles) {
    if !config.enabled {
        return;
    }

    let Some(hdparm) = process::resolve_binary(&config.binary) else {
        log::error!(
            "Unable to find hdparm executable - missing file path `{}`",
            config.binary.display()
        );
        return;
    };

    let label = match config.drives {
        SpinDownDrives::All => "all",
        SpinDownDrives::Parity => "parity",
    };
    log::info!("Attempting to spin down all {} drives...", label);

    let targets = selected_files(files, config.drives);
    if targets.is_empty() {
        log::info!("No drives to spin down.");
        return;
    }

    let shell_command = spin_down_command(&hdparm, &targets);

    match Command::new("sh").arg("-c").arg(&shell_command).output() {
        Ok(output) if output.status.success() => {
            log::info!("Successfully spun down drives.");
        }
        Ok(output) => {
            log::error!("Unable to successfully spin down hard drives, see error output below.");
            log::error!("{}", String::from_utf8_lossy(&output.stderr).trim_end());
            log::error!("Shell command executed: {}", shell_command);
        }
        Err(e) => {
            log::error!("Encountered exception while attempting to spin down drives:");
            log::error!("{}", e);
        }
    }
}
