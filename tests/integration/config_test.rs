// Configuration loading from disk

use std::fs;
use tempfile::TempDir;

use snapper::core::config::SpinDownDrives;
use snapper::{Config, SnapperError};

const FULL_CONFIG: &str = r#"{
    "snapraid": {
        "binary": "/usr/local/bin/snapraid",
        "config": "/etc/snapraid.conf",
        "nice": 5,
        "sync": { "pre_hash": true, "auto_sync": { "enabled": true, "max_attempts": 4 } },
        "diff": { "thresholds": { "updated": 500, "removed": 50 } },
        "scrub": { "enabled": true, "scrub_new": true, "check_percent": 5, "min_age": 30 }
    },
    "notifications": {
        "progress_interval_secs": 120,
        "email": { "enabled": true, "from_email": "nas@example.com", "to_email": "me@example.com" },
        "discord": { "enabled": false }
    },
    "logs": { "dir": "/var/log/snapper", "max_count": 7 },
    "spindown": { "enabled": true, "drives": "all" },
    "pid_file": "/run/snapper.pid"
}"#;

#[test]
fn test_load_full_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, FULL_CONFIG).unwrap();

    let config = Config::load(&path).unwrap();

    assert_eq!(config.snapraid.nice, Some(5));
    assert!(config.snapraid.sync.pre_hash);
    assert_eq!(config.snapraid.sync.auto_sync.max_attempts, 4);
    assert_eq!(config.snapraid.diff.thresholds.removed, 50);
    assert_eq!(config.snapraid.scrub.min_age, 30);
    assert_eq!(config.notifications.progress_interval_secs, 120);
    assert_eq!(
        config.notifications.email.binary.to_str(),
        Some("/usr/bin/mail")
    );
    assert_eq!(config.logs.max_count, 7);
    assert_eq!(config.spindown.drives, SpinDownDrives::All);
    assert_eq!(config.pid_file.to_str(), Some("/run/snapper.pid"));
}

#[test]
fn test_missing_config_file() {
    let dir = TempDir::new().unwrap();
    let result = Config::load(&dir.path().join("absent.json"));
    assert!(matches!(result, Err(SnapperError::MissingFile { .. })));
}

#[test]
fn test_enabled_email_requires_addresses() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{
            "snapraid": { "binary": "snapraid", "config": "/etc/snapraid.conf" },
            "notifications": { "email": { "enabled": true, "to_email": "me@example.com" } }
        }"#,
    )
    .unwrap();

    assert!(matches!(Config::load(&path), Err(SnapperError::Config(_))));
}

#[test]
fn test_check_percent_above_hundred_is_rejected() {
    let json = r#"{
        "snapraid": {
            "binary": "snapraid",
            "config": "/etc/snapraid.conf",
            "scrub": { "enabled": true, "check_percent": 101 }
        }
    }"#;
    assert!(matches!(Config::from_json(json), Err(SnapperError::Config(_))));
}

#[test]
fn test_default_path_ends_with_snapper_config() {
    if let Ok(path) = Config::default_path() {
        assert!(path.ends_with("snapper/config.json"));
    }
}
