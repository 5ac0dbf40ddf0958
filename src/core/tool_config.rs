//! Reads the content and parity file locations out of `snapraid.conf`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SnapperError};

static FILE_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?P<kind>content|(?:\d-)?parity) +(?P<path>.+/\w+\.(?:content|parity)) *$")
        .expect("content/parity pattern is valid")
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrayFiles {
    pub content: Vec<PathBuf>,
    pub parity: Vec<PathBuf>,
}

impl ArrayFiles {
    pub fn all(&self) -> impl Iterator<Item = &PathBuf> {
        self.content.iter().chain(self.parity.iter())
    }

    pub fn len(&self) -> usize {
        self.content.len() + self.parity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Extract `content` and `parity` entries from configuration text
pub fn parse_array_files(text: &str) -> ArrayFiles {
    let mut files = ArrayFiles::default();

    for entry in FILE_ENTRY.captures_iter(text) {
        let path = PathBuf::from(entry["path"].trim());
        if &entry["kind"] == "content" {
            files.content.push(path);
        } else {
            files.parity.push(path);
        }
    }

    files
}

/// Read the tool configuration file at `path`
pub fn read_array_files(path: &Path) -> Result<ArrayFiles> {
    if !path.is_file() {
        return Err(SnapperError::missing_file(
            "Unable to find SnapRAID configuration",
            path,
        ));
    }

    let text = fs::read_to_string(path)?;
    Ok(parse_array_files(&text))
}

/// Make sure every content and parity file the array depends on exists
pub fn sanity_check(path: &Path) -> Result<ArrayFiles> {
    let files = read_array_files(path)?;

    if let Some(missing) = files.all().find(|file| !file.is_file()) {
        return Err(SnapperError::missing_file(
            "Unable to locate required content/parity file",
            missing.clone(),
        ));
    }

    log::info!(
        "All {} content and parity files found, proceeding.",
        files.len()
    );

    Ok(files)
}
