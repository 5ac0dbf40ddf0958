// Report formatting module

pub mod discord_report;
pub mod email_report;
pub mod formatters;

// Re-export commonly used items for cleaner imports
pub use discord_report::create_discord_report;
pub use email_report::create_email_report;
pub use formatters::{escape_html, format_delta, format_optional_delta};
