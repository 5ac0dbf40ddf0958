use chrono::{DateTime, Local};
use std::time::{Duration, SystemTime};

/// Format an elapsed time as `HHh MMm SSs`
pub fn format_delta(delta: Duration) -> String {
    let seconds = delta.as_secs();
    let (hours, minutes) = (seconds / 3600, (seconds % 3600) / 60);

    format!("{:02}h {:02}m {:02}s", hours, minutes, seconds % 60)
}

/// Format an optional elapsed time, `-` when the job did not run
pub fn format_optional_delta(delta: Option<Duration>) -> String {
    delta.map(format_delta).unwrap_or_else(|| "-".to_string())
}

/// Format timestamp in human-readable format (YYYY-MM-DD HH:MM)
pub fn format_time(time: SystemTime) -> String {
    let datetime: DateTime<Local> = time.into();
    datetime.format("%Y-%m-%d %H:%M").to_string()
}

/// Escape text for inclusion in HTML
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }

    escaped
}
