use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::parse_number;
use crate::error::{Result, SnapperError};

static DRIVE_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^ *(?P<files>\d+) +(?P<fragmented>\d+) +(?P<excess>\d+) +(?P<wasted>[-.\d]+) +(?P<used>\d+) +(?P<free>\d+) +(?P<use>\d+)%(?: +(?P<name>\S+)|$)",
    )
    .expect("drive row pattern is valid")
});

static SCRUB_AGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"scrubbed (?P<age>\d+) days ago, the median (?P<median>\d+), the newest (?P<newest>\d+)")
        .expect("scrub age pattern is valid")
});

static UNSCRUBBED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^The (?P<percent>\d+)% of the array is not scrubbed")
        .expect("unscrubbed pattern is valid")
});

static ERROR_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^DANGER! In the array there are (?P<count>\d+) errors!")
        .expect("error count pattern is valid")
});

static ZERO_SUBSECOND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^You have (?P<count>\d+) files with zero sub-second timestamp")
        .expect("zero sub-second pattern is valid")
});

static SYNC_IN_PROGRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^You have a sync in progress").expect("sync in progress pattern is valid")
});

/// One row of the status table. A row without a drive name is the array total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriveStat {
    pub drive_name: Option<String>,
    pub files: u64,
    pub fragmented_files: u64,
    pub excess_fragments: u64,
    /// `None` when the tool prints `-` instead of a size
    pub wasted_gb: Option<f64>,
    pub used_gb: u64,
    pub free_gb: u64,
    pub use_percent: u64,
}

impl DriveStat {
    pub fn is_aggregate(&self) -> bool {
        self.drive_name.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScrubStat {
    pub unscrubbed_percent: u8,
    pub scrub_age_days: u64,
    pub median_age_days: u64,
    pub newest_age_days: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusReport {
    pub drives: Vec<DriveStat>,
    pub scrub: ScrubStat,
    /// Zero when the report has no `DANGER!` line
    pub error_count: u64,
    pub zero_subsecond_count: u64,
    pub sync_in_progress: bool,
}

/// Parse the output of `snapraid status`
pub fn parse_status(output: &str) -> Result<StatusReport> {
    let scrub_info = SCRUB_AGE.captures(output).ok_or_else(|| {
        SnapperError::UnparseableStatus("scrub summary sentence not found".to_string())
    })?;

    let drives = DRIVE_ROW
        .captures_iter(output)
        .map(|row| parse_drive_row(&row))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(SnapperError::UnparseableStatus)?;

    let unscrubbed_percent = optional_count(&UNSCRUBBED, output, "percent")?;
    if unscrubbed_percent > 100 {
        return Err(SnapperError::UnparseableStatus(format!(
            "unscrubbed percentage {} is out of range",
            unscrubbed_percent
        )));
    }

    let scrub = ScrubStat {
        unscrubbed_percent: unscrubbed_percent as u8,
        scrub_age_days: status_number(&scrub_info["age"], "scrub age")?,
        median_age_days: status_number(&scrub_info["median"], "median scrub age")?,
        newest_age_days: status_number(&scrub_info["newest"], "newest scrub age")?,
    };

    Ok(StatusReport {
        drives,
        scrub,
        error_count: optional_count(&ERROR_COUNT, output, "count")?,
        zero_subsecond_count: optional_count(&ZERO_SUBSECOND, output, "count")?,
        sync_in_progress: SYNC_IN_PROGRESS.is_match(output),
    })
}

fn parse_drive_row(row: &regex::Captures<'_>) -> std::result::Result<DriveStat, String> {
    let wasted = &row["wasted"];
    let wasted_gb = if wasted.chars().all(|c| c == '-') {
        None
    } else {
        Some(parse_number::<f64>(wasted, "wasted space")?)
    };

    Ok(DriveStat {
        drive_name: row.name("name").map(|m| m.as_str().to_string()),
        files: parse_number(&row["files"], "file count")?,
        fragmented_files: parse_number(&row["fragmented"], "fragmented files")?,
        excess_fragments: parse_number(&row["excess"], "excess fragments")?,
        wasted_gb,
        used_gb: parse_number(&row["used"], "used space")?,
        free_gb: parse_number(&row["free"], "free space")?,
        use_percent: parse_number(&row["use"], "use percent")?,
    })
}

/// Counts whose sentence is absent are zero
fn optional_count(pattern: &Regex, output: &str, group: &str) -> Result<u64> {
    match pattern.captures(output) {
        Some(caps) => status_number(&caps[group], group),
        None => Ok(0),
    }
}

fn status_number(value: &str, field: &str) -> Result<u64> {
    parse_number(value, field).map_err(SnapperError::UnparseableStatus)
}
