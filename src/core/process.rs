//! Process table lookups.

use std::path::{Path, PathBuf};
use sysinfo::{ProcessRefreshKind, RefreshKind, System};

/// Locate an executable. Paths are used as given; a bare name is looked up on `PATH`.
pub fn resolve_binary(binary: &Path) -> Option<PathBuf> {
    if binary.is_file() {
        return Some(binary.to_path_buf());
    }

    if binary.components().count() == 1 {
        return which::which(binary).ok();
    }

    None
}

fn process_table() -> System {
    System::new_with_specifics(
        RefreshKind::nothing().with_processes(ProcessRefreshKind::nothing()),
    )
}

/// Whether any process with this executable name is running (case-insensitive)
pub fn is_running(name: &str) -> bool {
    let name = name.to_lowercase();

    process_table()
        .processes()
        .values()
        .any(|process| process.name().to_string_lossy().to_lowercase() == name)
}
