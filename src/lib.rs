// Snapper Library - Public API

// Re-export error types
pub mod error;
pub use error::{Result, SnapperError};

// Module declarations
pub mod commands;
pub mod core;
pub mod notify;
pub mod ui;

// Re-export commonly used types
pub use core::config::Config;

// Initialize console-only logging
pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
}
