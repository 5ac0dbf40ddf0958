//! HTML email summarising a finished run.

use std::time::SystemTime;

use crate::core::job::RunReport;
use crate::core::parsers::{DriveStat, SmartStat};
use crate::ui::formatters::{escape_html, format_delta, format_optional_delta, format_time};

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>
  body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; color: #24292e; }
  table { border-collapse: collapse; margin-bottom: 1em; }
  th, td { border: 1px solid #d0d7de; padding: 4px 8px; text-align: right; }
  th:first-child, td:first-child { text-align: left; }
  tr.array_stats { font-weight: bold; background: #f6f8fa; }
  footer { color: #6a737d; font-size: 0.85em; }
</style>
</head>
<body>
SNAPPER_REPORT_CONTENT
</body>
</html>
"#;

/// HTML body for a successful run
pub fn create_email_report(report: &RunReport) -> String {
    let mut html = format!(
        "<h2>[Snapper] SnapRAID job completed successfully in {}</h2>\n",
        format_delta(report.total_time)
    );

    html.push_str(&touch_section(report));
    html.push_str(&sync_section(report));
    html.push_str(&scrub_section(report));
    html.push_str(&array_section(&report.status.drives));
    html.push_str(&smart_section(report));
    html.push_str(&format!(
        "<footer>Generated {}</footer>\n",
        format_time(SystemTime::now())
    ));

    TEMPLATE.replace("SNAPPER_REPORT_CONTENT", &html)
}

fn touch_section(report: &RunReport) -> String {
    let body = if report.zero_subsecond_count > 0 {
        format!(
            "<p>A total of <strong>{}</strong> file(s) had their sub-second value fixed.</p>",
            report.zero_subsecond_count
        )
    } else {
        "<p>No zero sub-second files were found.</p>".to_string()
    };

    format!("<h3>Touch Job</h3>\n{}\n", body)
}

fn sync_section(report: &RunReport) -> String {
    if !report.sync_job_ran {
        return "<h3>Sync Job</h3>\n<p>Sync Job did <strong>not</strong> run.</p>\n".to_string();
    }

    let diff = &report.diff;
    format!(
        "<h3>Sync Job</h3>\n\
         <p>Job finished successfully in <strong>{}</strong>.</p>\n\
         <p>File diff summary as follows:</p>\n\
         <ul>\n\
         <li>{} added</li>\n\
         <li>{} removed</li>\n\
         <li>{} updated</li>\n\
         <li>{} moved</li>\n\
         <li>{} copied</li>\n\
         <li>{} restored</li>\n\
         </ul>\n",
        format_optional_delta(report.sync_job_time),
        diff.added,
        diff.removed,
        diff.updated,
        diff.moved,
        diff.copied,
        diff.restored
    )
}

fn scrub_section(report: &RunReport) -> String {
    if !report.scrub_job_ran {
        return "<h3>Scrub Job</h3>\n<p>Scrub Job did <strong>not</strong> run.</p>\n".to_string();
    }

    let scrub = report.status.scrub;
    format!(
        "<h3>Scrub Job</h3>\n\
         <p>Job finished successfully in <strong>{}</strong>.</p>\n\
         <p><strong>{}%</strong> of the array has not been scrubbed, with the oldest block at \
         <strong>{}</strong> day(s), the median at <strong>{}</strong> day(s), and the newest at \
         <strong>{}</strong> day(s).</p>\n",
        format_optional_delta(report.scrub_job_time),
        scrub.unscrubbed_percent,
        scrub.scrub_age_days,
        scrub.median_age_days,
        scrub.newest_age_days
    )
}

fn array_section(drives: &[DriveStat]) -> String {
    let mut rows = String::new();

    for drive in drives {
        let class = if drive.is_aggregate() { " class=\"array_stats\"" } else { "" };
        let wasted = drive
            .wasted_gb
            .map(|gb| gb.to_string())
            .unwrap_or_else(|| "-".to_string());

        rows.push_str(&format!(
            "<tr{}><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            class,
            escape_html(drive.drive_name.as_deref().unwrap_or("Full Array")),
            drive.fragmented_files,
            drive.excess_fragments,
            wasted,
            drive.used_gb,
            drive.free_gb,
            drive.use_percent
        ));
    }

    format!(
        "<h3>SnapRAID Array Report</h3>\n<table>\n<thead>\n<tr>\
         <th>Drive</th><th>Fragmented Files</th><th>Excess Fragments</th>\
         <th>Wasted Space (GB)</th><th>Used Space (GB)</th><th>Free Space (GB)</th>\
         <th>Total Used (%)</th></tr>\n</thead>\n<tbody>\n{}</tbody>\n</table>\n",
        rows
    )
}

fn smart_drive_label(drive: &SmartStat) -> String {
    match &drive.disk_label {
        Some(disk) => format!("{} ({})", disk, drive.device_path),
        None => drive.device_path.clone(),
    }
}

fn smart_section(report: &RunReport) -> String {
    let mut rows = String::new();

    for drive in &report.smart.drives {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&smart_drive_label(drive)),
            drive.temperature_c,
            drive.power_on_days,
            drive.error_count,
            drive.failure_probability,
            escape_html(&drive.size),
            escape_html(&drive.serial)
        ));
    }

    format!(
        "<h3>SMART Report</h3>\n<table>\n<thead>\n<tr>\
         <th>Drive</th><th>Temperature (°C)</th><th>Power On Time (days)</th>\
         <th>Error Count</th><th>Failure Probability</th><th>Drive Size (TiB)</th>\
         <th>Serial Number</th></tr>\n</thead>\n<tbody>\n{}</tbody>\n</table>\n\
         <p>The current failure probability of any single drive this year is \
         <strong>{}%</strong>.</p>\n",
        rows, report.smart.global_failure_probability
    )
}
