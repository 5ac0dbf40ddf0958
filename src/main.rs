use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

use snapper::commands;

fn main() -> Result<()> {
    let matches = Command::new("snapper")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Runs SnapRAID maintenance jobs and reports the results")
        .disable_version_flag(true)
        .arg(
            Arg::new("force")
                .short('f')
                .long("force")
                .help("Ignore array errors and diff thresholds, and always sync")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("Path to the snapper configuration file")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .subcommand(Command::new("run").about("Run the SnapRAID jobs (default)"))
        .subcommand(
            Command::new("check")
                .about("Validate the configuration and the content/parity files without touching the array"),
        )
        .subcommand(Command::new("version").about("Shows version information"))
        .get_matches();

    match matches.subcommand() {
        Some(("run", sub_matches)) => {
            commands::run(sub_matches)?;
        }
        Some(("check", sub_matches)) => {
            snapper::init_logging();
            commands::check(sub_matches)?;
        }
        Some(("version", _)) => {
            commands::version()?;
        }
        _ => {
            commands::run(&matches)?;
        }
    }

    Ok(())
}
