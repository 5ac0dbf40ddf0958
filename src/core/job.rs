//! The maintenance job: sanity check, status, touch, diff, sync, scrub,
//! final status and SMART, reports and spin-down. Every step runs in order
//! on the calling thread; the first error stops the run.

use std::time::{Duration, Instant};

use crate::core::config::{Config, DiffThresholds};
use crate::core::parsers::{
    parse_diff, parse_smart, parse_status, DiffStat, SmartReport, StatusReport,
};
use crate::core::progress::ProgressMonitor;
use crate::core::runner::{ArrayTool, CommandOutput};
use crate::core::spindown;
use crate::core::sync_policy::SyncRetryPolicy;
use crate::core::tool_config;
use crate::error::{Result, SnapperError};
use crate::notify::{logged, notify_info, notify_warning, send_email, Notifier};
use crate::ui::formatters::format_delta;
use crate::ui::{create_discord_report, create_email_report};

pub const SUCCESS_SUBJECT: &str = "SnapRAID Job Completed Successfully";
pub const FAILURE_SUBJECT: &str = "WARNING! SnapRAID jobs unsuccessful";

/// Everything the reports need about a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub sync_job_ran: bool,
    pub scrub_job_ran: bool,
    pub sync_job_time: Option<Duration>,
    pub scrub_job_time: Option<Duration>,
    pub diff: DiffStat,
    pub zero_subsecond_count: u64,
    /// Status taken after sync and scrub
    pub status: StatusReport,
    pub smart: SmartReport,
    pub total_time: Duration,
}

pub struct JobRunner<'a> {
    config: &'a Config,
    tool: &'a dyn ArrayTool,
    notifier: &'a dyn Notifier,
    force: bool,
}

impl<'a> JobRunner<'a> {
    pub fn new(config: &'a Config, tool: &'a dyn ArrayTool, notifier: &'a dyn Notifier) -> Self {
        Self {
            config,
            tool,
            notifier,
            force: false,
        }
    }

    /// Ignore array errors and diff thresholds, and sync even without changes
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn run(&self) -> Result<RunReport> {
        let total_start = Instant::now();

        log::info!("Snapper started");
        notify_info(self.notifier, "Starting SnapRAID jobs...", None);

        log::info!("Running sanity checks...");
        let array_files = tool_config::sanity_check(&self.config.snapraid.config)?;

        log::info!("Checking for errors and files with zero sub-second timestamps...");
        let status = self.status()?;

        if status.error_count > 0 {
            if !self.force {
                return Err(SnapperError::ArrayErrors(status.error_count));
            }

            log::error!(
                "There are {} errors in you array, ignoring due to forced run.",
                status.error_count
            );
            notify_warning(
                self.notifier,
                &format!(
                    "There are **{}** errors in you array, ignoring due to forced run.",
                    status.error_count
                ),
            );
        }

        if status.zero_subsecond_count > 0 {
            log::info!(
                "Found {} file(s) with zero sub-second timestamp",
                status.zero_subsecond_count
            );
            log::info!("Running touch job...");
            self.tool.run(&["touch"], None, &[])?;
        }

        log::info!("Get SnapRAID diff...");
        let diff = self.diff()?;
        log::info!(
            "Diff output: {} equal, {} added, {} removed, {} updated, {} moved, {} copied, {} restored",
            diff.equal,
            diff.added,
            diff.removed,
            diff.updated,
            diff.moved,
            diff.copied,
            diff.restored
        );

        let sync_job_time = if self.force || diff.has_changes() || status.sync_in_progress {
            self.check_before_sync(&diff, status.sync_in_progress)?;
            Some(self.sync()?)
        } else {
            log::info!("No changes to sync, skipping.");
            notify_info(self.notifier, "No changes to sync", None);
            None
        };

        let scrub_job_time = self.scrub()?;

        log::info!("Fetching SnapRAID status...");
        let final_status = self.status()?;
        let scrub = final_status.scrub;
        log::info!(
            "{}% of the array has not been scrubbed, with the oldest block at {} day(s), \
             the median at {} day(s), and the newest at {} day(s).",
            scrub.unscrubbed_percent,
            scrub.scrub_age_days,
            scrub.median_age_days,
            scrub.newest_age_days
        );

        log::info!("Fetching smart data...");
        let smart = self.smart()?;
        log::info!(
            "Drive failure probability this year is {}%",
            smart.global_failure_probability
        );

        let report = RunReport {
            sync_job_ran: sync_job_time.is_some(),
            scrub_job_ran: scrub_job_time.is_some(),
            sync_job_time,
            scrub_job_time,
            diff,
            zero_subsecond_count: status.zero_subsecond_count,
            status: final_status,
            smart,
            total_time: total_start.elapsed(),
        };

        self.send_reports(&report);
        spindown::spin_down(&self.config.spindown, &array_files);

        log::info!("SnapRAID jobs completed successfully, exiting.");

        Ok(report)
    }

    fn status(&self) -> Result<StatusReport> {
        let output = self.tool.run(&["status"], None, &[])?;
        parse_status(&output.stdout)
    }

    fn diff(&self) -> Result<DiffStat> {
        // diff exits with 2 when there are changes to sync
        let output = self.tool.run(&["diff"], None, &[2])?;
        parse_diff(&output.stdout)
    }

    fn smart(&self) -> Result<SmartReport> {
        let output = self.tool.run(&["smart"], None, &[])?;
        parse_smart(&output.stdout)
    }

    fn check_before_sync(&self, diff: &DiffStat, sync_in_progress: bool) -> Result<()> {
        let thresholds = self.config.snapraid.diff.thresholds;

        if self.force {
            log::info!("Ignoring any thresholds and forcefully proceeding with sync.");
            return Ok(());
        }

        check_thresholds(diff, &thresholds)?;

        if sync_in_progress {
            log::info!("A previous sync in progress has been detected, resuming.");
        } else {
            log::info!(
                "Fewer files updated ({}) than the configured limit ({}), proceeding.",
                diff.updated,
                thresholds.updated
            );
            log::info!(
                "Fewer files removed ({}) than the configured limit ({}), proceeding.",
                diff.removed,
                thresholds.removed
            );
        }

        Ok(())
    }

    fn sync(&self) -> Result<Duration> {
        let sync_config = &self.config.snapraid.sync;
        let args: &[&str] = if sync_config.pre_hash {
            &["sync", "-h"]
        } else {
            &["sync"]
        };

        let start = Instant::now();

        SyncRetryPolicy::from_config(sync_config).run(|attempt| {
            log::info!(
                "Running SnapRAID sync ({}) {} pre-hashing...",
                attempt,
                if sync_config.pre_hash { "with" } else { "without" }
            );
            notify_info(self.notifier, &format!("Syncing **({})**...", attempt), None);

            self.run_with_progress(args)
        })?;

        let elapsed = start.elapsed();
        log::info!("Sync job finished, elapsed time {}", format_delta(elapsed));
        notify_info(
            self.notifier,
            &format!("Sync job finished, elapsed time **{}**", format_delta(elapsed)),
            None,
        );

        Ok(elapsed)
    }

    fn scrub(&self) -> Result<Option<Duration>> {
        let scrub_config = &self.config.snapraid.scrub;

        if !scrub_config.enabled {
            log::info!("Scrubbing not enabled, skipping.");
            return Ok(None);
        }

        log::info!("Running scrub job...");
        let start = Instant::now();

        if scrub_config.scrub_new {
            log::info!("Scrubbing new blocks...");
            notify_info(self.notifier, "Scrubbing new blocks...", None);
            self.run_with_progress(&["scrub", "-p", "new"])?;
        }

        log::info!("Scrubbing old blocks...");
        notify_info(self.notifier, "Scrubbing old blocks...", None);

        let check_percent = scrub_config.check_percent.to_string();
        let min_age = scrub_config.min_age.to_string();
        self.run_with_progress(&["scrub", "-p", &check_percent, "-o", &min_age])?;

        let elapsed = start.elapsed();
        log::info!("Scrub job finished, elapsed time {}", format_delta(elapsed));
        notify_info(
            self.notifier,
            &format!("Scrub job finished, elapsed time **{}**", format_delta(elapsed)),
            None,
        );

        Ok(Some(elapsed))
    }

    fn run_with_progress(&self, args: &[&str]) -> Result<CommandOutput> {
        let mut monitor = ProgressMonitor::new(
            self.notifier,
            self.config.notifications.progress_interval(),
        );
        let mut classify = |line: &str| monitor.classify(line);

        self.tool.run(args, Some(&mut classify), &[])
    }

    fn send_reports(&self, report: &RunReport) {
        send_email(self.notifier, SUCCESS_SUBJECT, &create_email_report(report));

        let (message, embeds) = create_discord_report(report);
        logged(self.notifier.chat(&message, &embeds, None));
    }
}

/// Refuse a sync that would update or remove more files than configured.
/// A zero threshold never refuses.
pub fn check_thresholds(diff: &DiffStat, thresholds: &DiffThresholds) -> Result<()> {
    let checks = [
        ("updated", diff.updated, thresholds.updated),
        ("removed", diff.removed, thresholds.removed),
    ];

    for (kind, count, threshold) in checks {
        if threshold > 0 && count > threshold {
            return Err(SnapperError::ThresholdExceeded {
                kind,
                count,
                threshold,
            });
        }
    }

    Ok(())
}

/// Log a failed run and tell both channels about it
pub fn report_failure(notifier: &dyn Notifier, error: &SnapperError) {
    let message = error.to_string();

    log::error!("{}", message);
    if let Some(stderr) = error.tool_stderr() {
        log::debug!("Full SnapRAID error output:\n{}", stderr);
    }

    send_email(notifier, FAILURE_SUBJECT, &message.replace('\n', "<br>"));
    notify_warning(notifier, &message);
}
