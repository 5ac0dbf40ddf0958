use anyhow::{Context, Result};

use crate::core::logging::init_run_logging;
use crate::core::{report_failure, JobRunner, PidLock, Snapraid};
use crate::notify::Notifications;

pub fn execute(matches: &clap::ArgMatches) -> Result<()> {
    let force = matches.get_flag("force");
    let (_, config) = super::load_config(matches)?;

    let _lock = PidLock::acquire(&config.pid_file)?;

    // Rotation must only happen while the lock is held
    init_run_logging(&config.logs).context("Failed to set up logging")?;

    let notifier = Notifications::from_config(&config.notifications)?;
    let tool = Snapraid::new(&config.snapraid);

    match JobRunner::new(&config, &tool, &notifier).force(force).run() {
        Ok(_) => Ok(()),
        Err(err) => {
            report_failure(&notifier, &err);
            Err(err.into())
        }
    }
}
