use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Number of stderr lines quoted in a tool failure message
pub const ERROR_TAIL_LINES: usize = 10;

/// Custom error type for snapper
#[derive(Error, Debug)]
pub enum SnapperError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unable to find SnapRAID executable - missing file path `{}`", .0.display())]
    MissingExecutable(PathBuf),

    #[error("SnapRAID already seems to be running, unable to proceed.")]
    AlreadyRunning,

    #[error("snapper already appears to be running (pid {0})")]
    LockHeld(u32),

    #[error("{description} - missing file path `{}`", .path.display())]
    MissingFile { description: String, path: PathBuf },

    #[error("Unable to parse SnapRAID status: {0}")]
    UnparseableStatus(String),

    #[error("Unable to parse diff output from SnapRAID, not proceeding: {0}")]
    UnparseableDiff(String),

    #[error("Unable to parse drive data or global failure percentage, not proceeding: {0}")]
    UnparseableSmart(String),

    #[error(
        "There are {0} errors in your array, you should review this immediately. \
         All jobs have been halted."
    )]
    ArrayErrors(u64),

    #[error("More files ({count}) have been {kind} than the configured max ({threshold})")]
    ThresholdExceeded {
        kind: &'static str,
        count: u64,
        threshold: u64,
    },

    #[error(
        "A critical SnapRAID error was encountered during command `snapraid {command}`. \
         The process exited with code `{}`.\n\
         Here are the last **10 lines** from the error log:\n```\n{}\n```\n\
         This requires your immediate attention.",
        .exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string()),
        tail_lines(.stderr, ERROR_TAIL_LINES)
    )]
    CriticalToolFailure {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Sync still failing after {attempts} attempt(s). {source}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        source: Box<SnapperError>,
    },

    #[error("Notification delivery failed: {0}")]
    NotificationDelivery(String),
}

/// Result type alias for snapper
pub type Result<T> = std::result::Result<T, SnapperError>;

impl SnapperError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        SnapperError::Config(msg.into())
    }

    /// Create a missing file error
    pub fn missing_file<S: Into<String>, P: Into<PathBuf>>(description: S, path: P) -> Self {
        SnapperError::MissingFile {
            description: description.into(),
            path: path.into(),
        }
    }

    pub fn notification<S: Into<String>>(msg: S) -> Self {
        SnapperError::NotificationDelivery(msg.into())
    }

    /// Full stderr captured from the tool, when this error came from one
    pub fn tool_stderr(&self) -> Option<&str> {
        match self {
            SnapperError::CriticalToolFailure { stderr, .. } => Some(stderr),
            SnapperError::RetryExhausted { source, .. } => source.tool_stderr(),
            _ => None,
        }
    }
}

/// Last `count` lines of `text`, joined with newlines
pub fn tail_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}
