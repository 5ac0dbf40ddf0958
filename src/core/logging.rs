//! Run logging: console through env_logger plus two log files.
//!
//! `snapper.log` receives regular messages, `snapper_raw.log` receives the
//! same messages plus every line the array tool prints (target
//! [`RAW_TARGET`]). Raw lines never reach the console and are recorded at
//! info level and above whatever `RUST_LOG` says. Files left over from the
//! previous run are gzip-rotated on start-up.

use chrono::Local;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{Level, LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::config::LogsConfig;
use crate::error::{Result, SnapperError};

/// Log target carrying verbatim tool output
pub const RAW_TARGET: &str = "snapper::raw";

pub const MAIN_LOG_FILE: &str = "snapper.log";
pub const RAW_LOG_FILE: &str = "snapper_raw.log";

struct RunLogger {
    console: env_logger::Logger,
    main: Mutex<LineWriter<File>>,
    raw: Mutex<LineWriter<File>>,
}

impl RunLogger {
    fn open(console: env_logger::Logger, main_path: &Path, raw_path: &Path) -> io::Result<Self> {
        Ok(Self {
            console,
            main: Mutex::new(LineWriter::new(open_log(main_path)?)),
            raw: Mutex::new(LineWriter::new(open_log(raw_path)?)),
        })
    }

    /// Most verbose level any record can pass with
    fn max_level(&self) -> LevelFilter {
        self.console.filter().max(LevelFilter::Info)
    }
}

fn is_raw(metadata: &Metadata<'_>) -> bool {
    metadata.target() == RAW_TARGET && metadata.level() <= Level::Info
}

impl Log for RunLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        is_raw(metadata) || self.console.enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        if is_raw(record.metadata()) {
            let _ = self.raw.lock().write_all(format_line(record).as_bytes());
            return;
        }

        if record.target() == RAW_TARGET || !self.console.matches(record) {
            return;
        }

        let line = format_line(record);

        self.console.log(record);
        let _ = self.main.lock().write_all(line.as_bytes());
        let _ = self.raw.lock().write_all(line.as_bytes());
    }

    fn flush(&self) {
        self.console.flush();
        let _ = self.main.lock().flush();
        let _ = self.raw.lock().flush();
    }
}

fn format_line(record: &Record<'_>) -> String {
    format!(
        "[{}] - [{}] - {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        record.level(),
        record.args()
    )
}

/// Install the run logger. Must be called once, after the run lock is held.
pub fn init_run_logging(config: &LogsConfig) -> Result<()> {
    fs::create_dir_all(&config.dir)?;

    let main_path = config.dir.join(MAIN_LOG_FILE);
    let raw_path = config.dir.join(RAW_LOG_FILE);

    rotate(&main_path, config.max_count)?;
    rotate(&raw_path, config.max_count)?;

    let console = env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .build();
    let logger = RunLogger::open(console, &main_path, &raw_path)?;
    let max_level = logger.max_level();

    log::set_boxed_logger(Box::new(logger))
        .map_err(|e| SnapperError::config(format!("Logger already initialized: {}", e)))?;
    log::set_max_level(max_level);

    Ok(())
}

fn open_log(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Path of the `n`th rotated copy: `snapper.log` -> `snapper.log.<n>.gz`
pub fn rotated_path(path: &Path, n: usize) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{}.gz", n));
    PathBuf::from(name)
}

/// Compress `path` into `path.1.gz`, shifting older copies up and keeping at
/// most `max_count` of them. Does nothing when `path` does not exist.
pub fn rotate(path: &Path, max_count: usize) -> io::Result<()> {
    if !path.is_file() {
        return Ok(());
    }

    let keep = max_count.max(1);

    let oldest = rotated_path(path, keep);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }

    for n in (1..keep).rev() {
        let from = rotated_path(path, n);
        if from.exists() {
            fs::rename(&from, rotated_path(path, n + 1))?;
        }
    }

    let mut input = File::open(path)?;
    let mut encoder = GzEncoder::new(File::create(rotated_path(path, 1))?, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?;

    fs::remove_file(path)?;

    Ok(())
}
