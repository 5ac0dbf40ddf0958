//! Progress line handling for long running commands (sync, scrub).

use once_cell::sync::Lazy;
use regex::Regex;
use std::time::{Duration, Instant};

use crate::notify::{notify_info, MessageId, Notifier};

static PROGRESS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<percent>\d+)%, (?P<mb>\d+) MB(?:, (?P<rate>\d+) MB/s, (?P<stripe>\d+) stripe/s, CPU (?P<cpu>\d+)%, (?P<eta_h>\d+):(?P<eta_m>\d+) ETA)?$",
    )
    .expect("progress pattern is valid")
});

/// One progress line printed by the tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSample {
    pub percent: u64,
    pub processed_mb: u64,
    pub rate_mb_s: Option<u64>,
    pub stripe_rate: Option<u64>,
    pub cpu_percent: Option<u64>,
    pub eta: Option<Duration>,
}

impl ProgressSample {
    pub fn parse(line: &str) -> Option<Self> {
        let caps = PROGRESS_LINE.captures(line)?;
        let number = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u64>().ok());

        let eta = match (number("eta_h"), number("eta_m")) {
            (Some(hours), Some(minutes)) => Some(Duration::from_secs(hours * 3600 + minutes * 60)),
            _ => None,
        };

        Some(Self {
            percent: number("percent")?,
            processed_mb: number("mb")?,
            rate_mb_s: number("rate"),
            stripe_rate: number("stripe"),
            cpu_percent: number("cpu"),
            eta,
        })
    }

    /// Chat text for this sample
    pub fn message(&self) -> String {
        let mut message = format!(
            "Current progress **{}%** (`{} MB`)",
            self.percent, self.processed_mb
        );

        if let (Some(rate), Some(stripe), Some(cpu)) =
            (self.rate_mb_s, self.stripe_rate, self.cpu_percent)
        {
            message.push_str(&format!(
                ", processing at **{} MB/s** (*{} stripe/s, {}% CPU*)",
                rate, stripe, cpu
            ));

            if let Some(eta) = self.eta {
                let minutes = eta.as_secs() / 60;
                message.push_str(&format!(". **ETA:** {}h {}m", minutes / 60, minutes % 60));
            }
        }

        message
    }
}

/// Stdout classifier that swallows progress lines and reports them at most
/// once per `interval`, editing the previous report when possible.
pub struct ProgressMonitor<'a> {
    notifier: &'a dyn Notifier,
    interval: Duration,
    last_notified_at: Instant,
    message_id: Option<MessageId>,
}

impl<'a> ProgressMonitor<'a> {
    pub fn new(notifier: &'a dyn Notifier, interval: Duration) -> Self {
        Self::starting_at(notifier, interval, Instant::now())
    }

    pub fn starting_at(notifier: &'a dyn Notifier, interval: Duration, start: Instant) -> Self {
        Self {
            notifier,
            interval,
            last_notified_at: start,
            message_id: None,
        }
    }

    /// Returns `true` when `line` is a progress line and must be left out of the output
    pub fn classify(&mut self, line: &str) -> bool {
        self.classify_at(line, Instant::now())
    }

    pub fn classify_at(&mut self, line: &str, now: Instant) -> bool {
        let Some(sample) = ProgressSample::parse(line) else {
            return false;
        };

        if now.saturating_duration_since(self.last_notified_at) >= self.interval {
            let posted = notify_info(self.notifier, &sample.message(), self.message_id.as_deref());

            if posted.is_some() {
                self.message_id = posted;
            }

            self.last_notified_at = now;
        }

        true
    }
}
