use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

use super::parse_number;
use crate::error::{Result, SnapperError};

static SMART_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^ *(?P<temp>\d+|-) +(?P<power>\d+|-) +(?P<errors>\d+|-) +(?P<fp>\d+%|-|SSD) +(?P<size>\S+) +(?P<serial>\S+) +(?P<device>\S+) +(?P<disk>\S+)$",
    )
    .expect("smart row pattern is valid")
});

static GLOBAL_FP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"next year is (?P<fp>\d+)%").expect("global failure probability pattern is valid")
});

/// A SMART attribute the tool may print as `-`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SmartValue<T> {
    Known(T),
    Unknown,
}

impl<T: fmt::Display> fmt::Display for SmartValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmartValue::Known(value) => write!(f, "{}", value),
            SmartValue::Unknown => write!(f, "-"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureProbability {
    Percent(u32),
    Unknown,
    /// The tool has no failure model for solid-state drives
    SolidState,
}

impl fmt::Display for FailureProbability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureProbability::Percent(p) => write!(f, "{}%", p),
            FailureProbability::Unknown => write!(f, "-"),
            FailureProbability::SolidState => write!(f, "SSD"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmartStat {
    /// Array disk name, `None` for devices outside the array (printed as `-`)
    pub disk_label: Option<String>,
    pub device_path: String,
    pub serial: String,
    pub temperature_c: SmartValue<u64>,
    pub power_on_days: SmartValue<u64>,
    pub error_count: SmartValue<u64>,
    pub failure_probability: FailureProbability,
    /// Size as printed by the tool, in TB
    pub size: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SmartReport {
    pub drives: Vec<SmartStat>,
    /// Probability that at least one disk fails within a year
    pub global_failure_probability: u32,
}

/// Parse the output of `snapraid smart`
pub fn parse_smart(output: &str) -> Result<SmartReport> {
    let global = GLOBAL_FP.captures(output).ok_or_else(|| {
        SnapperError::UnparseableSmart("global failure probability sentence not found".to_string())
    })?;

    let drives = SMART_ROW
        .captures_iter(output)
        .map(|row| parse_smart_row(&row))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(SnapperError::UnparseableSmart)?;

    Ok(SmartReport {
        drives,
        global_failure_probability: parse_number(&global["fp"], "global failure probability")
            .map_err(SnapperError::UnparseableSmart)?,
    })
}

fn parse_smart_row(row: &regex::Captures<'_>) -> std::result::Result<SmartStat, String> {
    let failure_probability = match &row["fp"] {
        "-" => FailureProbability::Unknown,
        "SSD" => FailureProbability::SolidState,
        percent => FailureProbability::Percent(parse_number(
            percent.trim_end_matches('%'),
            "failure probability",
        )?),
    };

    let disk = &row["disk"];

    Ok(SmartStat {
        disk_label: (disk != "-").then(|| disk.to_string()),
        device_path: row["device"].to_string(),
        serial: row["serial"].to_string(),
        temperature_c: smart_value(&row["temp"], "temperature")?,
        power_on_days: smart_value(&row["power"], "power on days")?,
        error_count: smart_value(&row["errors"], "error count")?,
        failure_probability,
        size: row["size"].to_string(),
    })
}

fn smart_value(value: &str, field: &str) -> std::result::Result<SmartValue<u64>, String> {
    if value == "-" {
        Ok(SmartValue::Unknown)
    } else {
        parse_number(value, field).map(SmartValue::Known)
    }
}
