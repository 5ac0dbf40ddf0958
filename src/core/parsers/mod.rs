//! Parsers for the text reports printed by SnapRAID.
//!
//! Each parser takes the full stdout of one command and returns typed
//! records. The tool's text layout is the only contract, so all pattern
//! matching lives here.

mod diff;
mod smart;
mod status;

pub use diff::{parse_diff, DiffStat};
pub use smart::{parse_smart, FailureProbability, SmartReport, SmartStat, SmartValue};
pub use status::{parse_status, DriveStat, ScrubStat, StatusReport};

use std::str::FromStr;

/// Parse a captured integer group. The patterns only capture digits, so a
/// failure here means the value overflowed.
pub(crate) fn parse_number<T: FromStr>(value: &str, field: &str) -> Result<T, String> {
    value
        .parse::<T>()
        .map_err(|_| format!("invalid value `{}` for {}", value, field))
}
