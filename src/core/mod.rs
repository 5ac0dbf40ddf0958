// Core business logic module

pub mod config;
pub mod job;
pub mod lock;
pub mod logging;
pub mod parsers;
pub mod process;
pub mod progress;
pub mod runner;
pub mod spindown;
pub mod sync_policy;
pub mod tool_config;

// Re-export commonly used items
pub use config::Config;
pub use job::{report_failure, JobRunner, RunReport};
pub use lock::PidLock;
pub use progress::{ProgressMonitor, ProgressSample};
pub use runner::{ArrayTool, CommandOutput, Snapraid};
pub use sync_policy::SyncRetryPolicy;
pub use tool_config::ArrayFiles;
