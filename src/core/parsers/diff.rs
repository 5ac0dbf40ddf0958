use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::parse_number;
use crate::error::{Result, SnapperError};

static DIFF_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^ *(?P<equal>\d+) equal\n *(?P<added>\d+) added\n *(?P<removed>\d+) removed\n *(?P<updated>\d+) updated\n *(?P<moved>\d+) moved\n *(?P<copied>\d+) copied\n *(?P<restored>\d+) restored$",
    )
    .expect("diff block pattern is valid")
});

/// Summary block printed at the end of `snapraid diff`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffStat {
    pub equal: u64,
    pub added: u64,
    pub removed: u64,
    pub updated: u64,
    pub moved: u64,
    pub copied: u64,
    pub restored: u64,
}

impl DiffStat {
    /// Number of files that differ from the last sync
    pub fn changes(&self) -> u64 {
        self.added + self.removed + self.updated + self.moved + self.copied + self.restored
    }

    pub fn has_changes(&self) -> bool {
        self.changes() > 0
    }
}

/// Parse the output of `snapraid diff`.
///
/// Exactly one summary block must be present. A second block makes the
/// output ambiguous and is rejected rather than picking one.
pub fn parse_diff(output: &str) -> Result<DiffStat> {
    let mut blocks = DIFF_BLOCK.captures_iter(output);

    let block = blocks
        .next()
        .ok_or_else(|| SnapperError::UnparseableDiff("no diff summary block found".to_string()))?;

    if blocks.next().is_some() {
        return Err(SnapperError::UnparseableDiff(
            "more than one diff summary block found".to_string(),
        ));
    }

    let field = |name: &str| -> Result<u64> {
        parse_number(&block[name], name).map_err(SnapperError::UnparseableDiff)
    };

    Ok(DiffStat {
        equal: field("equal")?,
        added: field("added")?,
        removed: field("removed")?,
        updated: field("updated")?,
        moved: field("moved")?,
        copied: field("copied")?,
        restored: field("restored")?,
    })
}
