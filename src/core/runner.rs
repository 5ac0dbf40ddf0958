//! Runs the array tool and collects its output.
//!
//! stdout and stderr are drained by two scoped threads so a child that
//! fills one pipe never blocks on the other. Every line is mirrored to an
//! [`OutputSink`]; stdout lines can be claimed by a classifier (progress
//! lines) and are then left out of the returned output.

use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

use crate::core::config::SnapraidConfig;
use crate::core::logging::RAW_TARGET;
use crate::core::process;
use crate::error::{Result, SnapperError};

/// Stdout line classifier. Returning `true` consumes the line.
pub type LineClassifier<'a> = dyn FnMut(&str) -> bool + Send + 'a;

/// Captured output of one tool invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// stdout lines not consumed by the classifier
    pub stdout: String,
    pub stderr: String,
}

/// Anything that can run array tool commands
pub trait ArrayTool {
    /// Run the tool with `args`. Exit code 0 and any code in
    /// `acceptable_exit_codes` count as success.
    fn run(
        &self,
        args: &[&str],
        classifier: Option<&mut LineClassifier<'_>>,
        acceptable_exit_codes: &[i32],
    ) -> Result<CommandOutput>;
}

/// Receives every line the tool prints, before classification
pub trait OutputSink: Send + Sync {
    fn stdout_line(&self, line: &str);
    fn stderr_line(&self, line: &str);
}

/// Mirrors tool output to the raw log target
pub struct RawLogSink;

impl OutputSink for RawLogSink {
    fn stdout_line(&self, line: &str) {
        log::info!(target: RAW_TARGET, "{}", line);
    }

    fn stderr_line(&self, line: &str) {
        log::error!(target: RAW_TARGET, "{}", line);
    }
}

/// The SnapRAID binary plus the options every invocation shares
pub struct Snapraid {
    binary: PathBuf,
    config: PathBuf,
    nice: Option<i32>,
    sink: Box<dyn OutputSink>,
}

impl Snapraid {
    pub fn new(config: &SnapraidConfig) -> Self {
        Self::with_sink(config, Box::new(RawLogSink))
    }

    pub fn with_sink(config: &SnapraidConfig, sink: Box<dyn OutputSink>) -> Self {
        Self {
            binary: config.binary.clone(),
            config: config.config.clone(),
            nice: config.nice,
            sink,
        }
    }

    fn process_name(&self) -> String {
        self.binary
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "snapraid".to_string())
    }

    /// Resolve the binary and make sure no other instance of it is running
    fn check_preconditions(&self) -> Result<PathBuf> {
        let binary = process::resolve_binary(&self.binary)
            .ok_or_else(|| SnapperError::MissingExecutable(self.binary.clone()))?;

        if process::is_running(&self.process_name()) {
            return Err(SnapperError::AlreadyRunning);
        }

        Ok(binary)
    }
}

impl ArrayTool for Snapraid {
    fn run(
        &self,
        args: &[&str],
        classifier: Option<&mut LineClassifier<'_>>,
        acceptable_exit_codes: &[i32],
    ) -> Result<CommandOutput> {
        let binary = self.check_preconditions()?;

        let mut command = Command::new(binary);
        command
            .arg("--conf")
            .arg(&self.config)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(nice) = self.nice {
            lower_priority(&mut command, nice);
        }

        log::debug!("Running snapraid {}", args.join(" "));

        let mut child = command.spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("child stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("child stderr was not captured"))?;

        let sink = self.sink.as_ref();

        let (stdout_lines, stderr_lines) = thread::scope(|scope| {
            let out_reader = scope.spawn(move || drain_stdout(stdout, sink, classifier));
            let err_reader = scope.spawn(move || drain_stderr(stderr, sink));

            (join_reader(out_reader.join()), join_reader(err_reader.join()))
        });

        let status = child.wait()?;
        let stdout_lines = stdout_lines?;
        let stderr_lines = stderr_lines?;

        let exit_code = status.code();
        let accepted = matches!(exit_code, Some(code) if code == 0 || acceptable_exit_codes.contains(&code));

        if !accepted {
            return Err(SnapperError::CriticalToolFailure {
                command: args.join(" "),
                exit_code,
                stderr: stderr_lines.join("\n"),
            });
        }

        Ok(CommandOutput {
            stdout: stdout_lines.join("\n"),
            stderr: stderr_lines.join("\n"),
        })
    }
}

fn drain_stdout<R: Read>(
    pipe: R,
    sink: &dyn OutputSink,
    mut classifier: Option<&mut LineClassifier<'_>>,
) -> io::Result<Vec<String>> {
    let mut kept = Vec::new();

    for_each_line(pipe, |line| {
        sink.stdout_line(&line);

        let consumed = match classifier.as_deref_mut() {
            Some(classify) => classify(&line),
            None => false,
        };

        if !consumed {
            kept.push(line);
        }
    })?;

    Ok(kept)
}

fn drain_stderr<R: Read>(pipe: R, sink: &dyn OutputSink) -> io::Result<Vec<String>> {
    let mut lines = Vec::new();

    for_each_line(pipe, |line| {
        sink.stderr_line(&line);
        lines.push(line);
    })?;

    Ok(lines)
}

/// Read `pipe` line by line, replacing invalid UTF-8 and trimming trailing whitespace.
/// `\n`, `\r\n` and a lone `\r` all end a line; progress frames are `\r`-separated.
fn for_each_line<R: Read, F: FnMut(String)>(pipe: R, mut handle: F) -> io::Result<()> {
    let mut reader = BufReader::new(pipe);
    let mut buffer = Vec::new();

    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer)? == 0 {
            return Ok(());
        }

        let mut content = buffer.as_slice();
        if let Some(rest) = content.strip_suffix(b"\n") {
            content = rest;
        }
        if let Some(rest) = content.strip_suffix(b"\r") {
            content = rest;
        }

        for frame in content.split(|&byte| byte == b'\r') {
            handle(String::from_utf8_lossy(frame).trim_end().to_string());
        }
    }
}

fn join_reader<T>(joined: thread::Result<io::Result<T>>) -> io::Result<T> {
    joined.unwrap_or_else(|_| Err(io::Error::other("output reader thread panicked")))
}

/// Raise the child's niceness by `nice` and, on Linux, set its best-effort IO priority.
///
/// The IO level follows the kernel's default mapping `(nice + 20) / 5`.
#[cfg(unix)]
fn lower_priority(command: &mut Command, nice: i32) {
    use std::os::unix::process::CommandExt;

    // SAFETY: getpriority on the calling process cannot fail, so -1 is a real niceness
    let current = unsafe { libc::getpriority(libc::PRIO_PROCESS, 0) };
    let target = target_niceness(current, nice);

    // SAFETY: the hook only issues async-signal-safe syscalls
    unsafe {
        command.pre_exec(move || {
            if libc::setpriority(libc::PRIO_PROCESS, 0, target) != 0 {
                return Err(io::Error::last_os_error());
            }

            #[cfg(target_os = "linux")]
            set_io_priority(io_priority_level(nice))?;

            Ok(())
        });
    }
}

#[cfg(not(unix))]
fn lower_priority(_command: &mut Command, _nice: i32) {}

/// Niceness after adding `increment` to `current`, within the kernel's range
pub fn target_niceness(current: i32, increment: i32) -> i32 {
    current.saturating_add(increment).clamp(-20, 19)
}

/// Best-effort IO priority level (0-7) matching a CPU nice level
pub fn io_priority_level(nice: i32) -> i32 {
    (nice + 20).div_euclid(5).clamp(0, 7)
}

#[cfg(target_os = "linux")]
fn set_io_priority(level: i32) -> io::Result<()> {
    const IOPRIO_WHO_PROCESS: libc::c_int = 1;
    const IOPRIO_CLASS_BE: libc::c_int = 2;
    const IOPRIO_CLASS_SHIFT: libc::c_int = 13;

    let priority = (IOPRIO_CLASS_BE << IOPRIO_CLASS_SHIFT) | level;

    // SAFETY: ioprio_set takes three integers and touches no memory
    let result = unsafe { libc::syscall(libc::SYS_ioprio_set, IOPRIO_WHO_PROCESS, 0, priority) };

    if result == -1 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}
