use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, SnapperError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub snapraid: SnapraidConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub logs: LogsConfig,
    #[serde(default)]
    pub spindown: SpinDownConfig,
    /// Lock file guarding against overlapping runs
    #[serde(default = "default_pid_file")]
    pub pid_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapraid: SnapraidConfig::default(),
            notifications: NotificationsConfig::default(),
            logs: LogsConfig::default(),
            spindown: SpinDownConfig::default(),
            pid_file: default_pid_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapraidConfig {
    pub binary: PathBuf,
    /// The array tool's own configuration file
    pub config: PathBuf,
    /// CPU niceness applied to the tool; `null` leaves the priority untouched
    #[serde(default = "default_nice")]
    pub nice: Option<i32>,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub diff: DiffConfig,
    #[serde(default)]
    pub scrub: ScrubConfig,
}

impl Default for SnapraidConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("/usr/bin/snapraid"),
            config: PathBuf::from("/etc/snapraid.conf"),
            nice: default_nice(),
            sync: SyncConfig::default(),
            diff: DiffConfig::default(),
            scrub: ScrubConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Run `sync -h` so new data is hashed before it is written to parity
    #[serde(default)]
    pub pre_hash: bool,
    #[serde(default)]
    pub auto_sync: AutoSyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoSyncConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for AutoSyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_attempts: default_max_attempts(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffConfig {
    #[serde(default)]
    pub thresholds: DiffThresholds,
}

/// Upper bounds on diff counts before a sync is refused. Zero disables a bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffThresholds {
    #[serde(default)]
    pub updated: u64,
    #[serde(default)]
    pub removed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrubConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Scrub blocks that were never scrubbed before the regular pass
    #[serde(default)]
    pub scrub_new: bool,
    #[serde(default = "default_check_percent")]
    pub check_percent: u8,
    /// Minimum block age in days
    #[serde(default = "default_min_age")]
    pub min_age: u32,
}

impl Default for ScrubConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            scrub_new: false,
            check_percent: default_check_percent(),
            min_age: default_min_age(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Minimum seconds between two progress notifications
    #[serde(default = "default_progress_interval")]
    pub progress_interval_secs: u64,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub discord: DiscordConfig,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            progress_interval_secs: default_progress_interval(),
            email: EmailConfig::default(),
            discord: DiscordConfig::default(),
        }
    }
}

impl NotificationsConfig {
    pub fn progress_interval(&self) -> Duration {
        Duration::from_secs(self.progress_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_mail_binary")]
    pub binary: PathBuf,
    #[serde(default)]
    pub from_email: String,
    #[serde(default)]
    pub to_email: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            binary: default_mail_binary(),
            from_email: String::new(),
            to_email: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscordConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub webhook_id: String,
    #[serde(default)]
    pub webhook_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
    /// Rotated logs kept per file
    #[serde(default = "default_log_max_count")]
    pub max_count: usize,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            max_count: default_log_max_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpinDownConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_hdparm_binary")]
    pub binary: PathBuf,
    #[serde(default)]
    pub drives: SpinDownDrives,
}

impl Default for SpinDownConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            binary: default_hdparm_binary(),
            drives: SpinDownDrives::default(),
        }
    }
}

/// Which drives are spun down after a successful run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpinDownDrives {
    All,
    #[default]
    Parity,
}

fn default_pid_file() -> PathBuf {
    PathBuf::from("/tmp/snapper.pid")
}

fn default_nice() -> Option<i32> {
    Some(10)
}

fn default_max_attempts() -> u32 {
    3
}

fn default_check_percent() -> u8 {
    12
}

fn default_min_age() -> u32 {
    10
}

fn default_progress_interval() -> u64 {
    60
}

fn default_mail_binary() -> PathBuf {
    PathBuf::from("/usr/bin/mail")
}

fn default_hdparm_binary() -> PathBuf {
    PathBuf::from("/usr/sbin/hdparm")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_log_max_count() -> usize {
    14
}

impl Config {
    /// Load and validate the configuration at `path`
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SnapperError::missing_file(
                "Unable to find snapper configuration",
                path,
            ));
        }

        let data = fs::read_to_string(path)?;
        let config = Self::from_json(&data)?;

        Ok(config)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Default configuration path: `<config dir>/snapper/config.json`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SnapperError::config("Could not determine config directory"))?;

        Ok(config_dir.join("snapper").join("config.json"))
    }

    /// Check value ranges and the fields required by enabled features
    pub fn validate(&self) -> Result<()> {
        if let Some(nice) = self.snapraid.nice {
            if !(-20..=19).contains(&nice) {
                return Err(SnapperError::config(format!(
                    "snapraid.nice must be between -20 and 19, got {}",
                    nice
                )));
            }
        }

        if self.snapraid.sync.auto_sync.max_attempts == 0 {
            return Err(SnapperError::config(
                "snapraid.sync.auto_sync.max_attempts must be at least 1",
            ));
        }

        if self.snapraid.scrub.check_percent > 100 {
            return Err(SnapperError::config(format!(
                "snapraid.scrub.check_percent must be between 0 and 100, got {}",
                self.snapraid.scrub.check_percent
            )));
        }

        let email = &self.notifications.email;
        if email.enabled && (email.from_email.is_empty() || email.to_email.is_empty()) {
            return Err(SnapperError::config(
                "notifications.email requires from_email and to_email when enabled",
            ));
        }

        let discord = &self.notifications.discord;
        if discord.enabled && (discord.webhook_id.is_empty() || discord.webhook_token.is_empty())
        {
            return Err(SnapperError::config(
                "notifications.discord requires webhook_id and webhook_token when enabled",
            ));
        }

        Ok(())
    }
}
