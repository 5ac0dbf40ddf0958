//! Retry policy for `snapraid sync`.
//!
//! A sync fails when files change underneath it. SnapRAID then prints a
//! small set of warnings and asks for a rerun; those failures are safe to
//! retry. Anything else on stderr makes the failure fatal.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::config::SyncConfig;
use crate::core::runner::CommandOutput;
use crate::error::{Result, SnapperError};

static BENIGN_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:WARNING! You cannot modify (?:files|data disk) during a sync|Unexpected (?:time|size) change at file .+|Missing file .+|Rerun the sync command when finished|WARNING! With \d+ disks it's recommended to use \w+ parity levels|WARNING! Unexpected file errors!)\.?$",
    )
    .expect("benign sync error pattern is valid")
});

static RERUN_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^Rerun the sync command when finished").expect("rerun pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Only benign warnings, and the tool asked for a rerun
    Retryable,
    Fatal,
}

/// Classify the stderr of a failed sync
pub fn classify_sync_failure(stderr: &str) -> FailureClass {
    let only_benign = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .all(|line| BENIGN_LINE.is_match(line));

    if only_benign && RERUN_MARKER.is_match(stderr) {
        FailureClass::Retryable
    } else {
        FailureClass::Fatal
    }
}

/// Result of a single sync attempt
#[derive(Debug)]
pub enum AttemptOutcome {
    Done(CommandOutput),
    Retry(SnapperError),
    Fatal(SnapperError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncRetryPolicy {
    pub auto_retry: bool,
    pub max_attempts: u32,
}

impl SyncRetryPolicy {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            auto_retry: config.auto_sync.enabled,
            max_attempts: config.auto_sync.max_attempts.max(1),
        }
    }

    pub fn assess(&self, result: Result<CommandOutput>) -> AttemptOutcome {
        match result {
            Ok(output) => AttemptOutcome::Done(output),
            Err(err @ SnapperError::CriticalToolFailure { .. }) => {
                let retryable = err
                    .tool_stderr()
                    .map(classify_sync_failure)
                    .unwrap_or(FailureClass::Fatal);

                if retryable == FailureClass::Retryable {
                    log::info!(
                        "SnapRAID has indicated another sync is recommended, due to disks or \
                         files being modified during the sync process."
                    );
                    AttemptOutcome::Retry(err)
                } else {
                    AttemptOutcome::Fatal(err)
                }
            }
            Err(err) => AttemptOutcome::Fatal(err),
        }
    }

    /// Run `attempt` (called with the 1-based attempt number) until it
    /// succeeds, fails fatally, or the attempt budget is spent.
    ///
    /// The original error is returned unchanged on fatal failures and when
    /// auto-retry is off; an exhausted budget wraps it in `RetryExhausted`.
    pub fn run<F>(&self, mut attempt: F) -> Result<CommandOutput>
    where
        F: FnMut(u32) -> Result<CommandOutput>,
    {
        let mut attempt_number = 1;

        loop {
            match self.assess(attempt(attempt_number)) {
                AttemptOutcome::Done(output) => return Ok(output),
                AttemptOutcome::Fatal(err) => return Err(err),
                AttemptOutcome::Retry(err) => {
                    if !self.auto_retry {
                        return Err(err);
                    }

                    if attempt_number >= self.max_attempts {
                        return Err(SnapperError::RetryExhausted {
                            attempts: attempt_number,
                            source: Box::new(err),
                        });
                    }

                    log::info!("Re-running sync command with identical options...");
                    attempt_number += 1;
                }
            }
        }
    }
}
