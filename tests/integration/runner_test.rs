// Runs the real command runner against a shell script standing in for SnapRAID

#![cfg(unix)]

use parking_lot::Mutex;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::process::Command;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

use snapper::core::config::SnapraidConfig;
use snapper::core::runner::{ArrayTool, OutputSink, Snapraid};
use snapper::SnapperError;

// Spawning while another thread holds a freshly written script open fails with ETXTBSY
static SPAWN_LOCK: Mutex<()> = parking_lot::const_mutex(());

const SCRIPT: &str = r#"#!/bin/sh
conf="$2"
shift 2
echo "$1" >> "$conf.calls"
echo "args: $*"
case "$1" in
  sleep)
    echo started > "$conf.started"
    sleep 30
    echo done
    ;;
  nice)
    cut -d' ' -f19 /proc/$$/stat
    ;;
  sync)
    echo "10%, 100 MB"
    echo "Everything OK"
    echo "WARNING! Unexpected file errors!" >&2
    ;;
  diff)
    echo "   5 equal"
    exit 2
    ;;
  fail)
    i=1
    while [ $i -le 12 ]; do echo "error line $i" >&2; i=$((i + 1)); done
    exit 3
    ;;
esac
exit 0
"#;

#[derive(Clone, Default)]
struct RecordingSink {
    stdout: Arc<Mutex<Vec<String>>>,
    stderr: Arc<Mutex<Vec<String>>>,
}

impl OutputSink for RecordingSink {
    fn stdout_line(&self, line: &str) {
        self.stdout.lock().push(line.to_string());
    }

    fn stderr_line(&self, line: &str) {
        self.stderr.lock().push(line.to_string());
    }
}

struct ScriptFixture {
    _dir: TempDir,
    config: SnapraidConfig,
}

fn fixture() -> ScriptFixture {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("fake-snapraid");
    fs::write(&script, SCRIPT).unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let config = SnapraidConfig {
        binary: script,
        config: dir.path().join("snapraid.conf"),
        nice: None,
        ..SnapraidConfig::default()
    };

    ScriptFixture { _dir: dir, config }
}

#[test]
fn test_output_is_captured_and_classified() {
    let _guard = SPAWN_LOCK.lock();
    let fixture = fixture();
    let sink = RecordingSink::default();
    let tool = Snapraid::with_sink(&fixture.config, Box::new(sink.clone()));

    let mut progress = Vec::new();
    let mut classify = |line: &str| {
        let is_progress = line.contains("MB");
        if is_progress {
            progress.push(line.to_string());
        }
        is_progress
    };

    let output = tool.run(&["sync", "-h"], Some(&mut classify), &[]).unwrap();

    assert_eq!(output.stdout, "args: sync -h\nEverything OK");
    assert_eq!(output.stderr, "WARNING! Unexpected file errors!");
    assert_eq!(progress, vec!["10%, 100 MB"]);
    assert_eq!(sink.stdout.lock().len(), 3);
    assert_eq!(*sink.stderr.lock(), vec!["WARNING! Unexpected file errors!"]);
}

#[test]
fn test_acceptable_exit_code() {
    let _guard = SPAWN_LOCK.lock();
    let fixture = fixture();
    let tool = Snapraid::with_sink(&fixture.config, Box::new(RecordingSink::default()));

    let output = tool.run(&["diff"], None, &[2]).unwrap();
    assert!(output.stdout.ends_with("5 equal"));

    assert!(matches!(
        tool.run(&["diff"], None, &[]),
        Err(SnapperError::CriticalToolFailure {
            exit_code: Some(2),
            ..
        })
    ));
}

#[test]
fn test_failure_quotes_last_stderr_lines() {
    let _guard = SPAWN_LOCK.lock();
    let fixture = fixture();
    let tool = Snapraid::with_sink(&fixture.config, Box::new(RecordingSink::default()));

    let err = tool.run(&["fail"], None, &[]).unwrap_err();

    assert_eq!(err.tool_stderr().map(|s| s.lines().count()), Some(12));
    let message = err.to_string();
    assert!(message.contains("`snapraid fail`"));
    assert!(message.contains("exited with code `3`"));
    assert!(message.contains("error line 3"));
    assert!(message.contains("error line 12"));
    assert!(!message.contains("error line 2\n"));
}

fn calls(config: &SnapraidConfig) -> Vec<String> {
    fs::read_to_string(config.config.with_extension("conf.calls"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_refuses_to_start_while_another_instance_runs() {
    let _guard = SPAWN_LOCK.lock();
    let fixture = fixture();
    let started = fixture.config.config.with_extension("conf.started");

    let mut other = Command::new(&fixture.config.binary)
        .arg("--conf")
        .arg(&fixture.config.config)
        .arg("sleep")
        .spawn()
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while !started.exists() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(20));
    }
    assert!(started.exists(), "background instance never started");

    let tool = Snapraid::with_sink(&fixture.config, Box::new(RecordingSink::default()));
    let result = tool.run(&["status"], None, &[]);

    other.kill().unwrap();
    other.wait().unwrap();

    assert!(matches!(result, Err(SnapperError::AlreadyRunning)));
    assert_eq!(calls(&fixture.config), vec!["sleep"]);
}

#[test]
fn test_child_niceness_is_raised() {
    let _guard = SPAWN_LOCK.lock();
    let mut fixture = fixture();
    fixture.config.nice = Some(10);

    // SAFETY: getpriority on the calling thread only reads its scheduling state
    let current = unsafe { libc::getpriority(libc::PRIO_PROCESS, 0) };
    let expected = (current + 10).min(19);

    let tool = Snapraid::with_sink(&fixture.config, Box::new(RecordingSink::default()));
    let output = tool.run(&["nice"], None, &[]).unwrap();

    assert_eq!(output.stdout, format!("args: nice\n{}", expected));
    assert_eq!(calls(&fixture.config), vec!["nice"]);
}
