//! Discord embeds summarising a finished run.

use crate::core::job::RunReport;
use crate::core::parsers::{DriveStat, SmartStat};
use crate::notify::{Embed, EmbedField, EmbedFooter};
use crate::ui::formatters::{format_delta, format_optional_delta};

pub const DID_RUN_COLOR: u32 = 1_737_287;
pub const DID_NOT_RUN_COLOR: u32 = 8_539_930;

/// Chat message and embeds for a successful run
pub fn create_discord_report(report: &RunReport) -> (String, Vec<Embed>) {
    let embeds = vec![
        touch_embed(report),
        sync_embed(report),
        scrub_embed(report),
        array_embed(&report.status.drives),
        smart_embed(report),
    ];

    let message = format!(
        ":turtle: SnapRAID job completed successfully in **{}**",
        format_delta(report.total_time)
    );

    (message, embeds)
}

fn touch_embed(report: &RunReport) -> Embed {
    let (description, color) = if report.zero_subsecond_count > 0 {
        (
            format!(
                "A total of **{}** file(s) had their sub-second value fixed.",
                report.zero_subsecond_count
            ),
            DID_RUN_COLOR,
        )
    } else {
        (
            "No zero sub-second files were found.".to_string(),
            DID_NOT_RUN_COLOR,
        )
    };

    Embed {
        title: "Touch Job".to_string(),
        description: Some(description),
        color: Some(color),
        ..Embed::default()
    }
}

fn sync_embed(report: &RunReport) -> Embed {
    if !report.sync_job_ran {
        return Embed {
            title: "Sync Job".to_string(),
            description: Some("Sync job did **not** run.".to_string()),
            color: Some(DID_NOT_RUN_COLOR),
            ..Embed::default()
        };
    }

    let diff = &report.diff;
    let fields = [
        ("Added", diff.added),
        ("Removed", diff.removed),
        ("Updated", diff.updated),
        ("Moved", diff.moved),
        ("Copied", diff.copied),
        ("Restored", diff.restored),
    ]
    .into_iter()
    .map(|(name, count)| EmbedField {
        name: name.to_string(),
        value: format!("```{}```", count),
        inline: true,
    })
    .collect();

    Embed {
        title: "Sync Job".to_string(),
        description: Some("Sync Job finished successfully :white_check_mark:".to_string()),
        color: Some(DID_RUN_COLOR),
        fields,
        footer: Some(elapsed_footer(report.sync_job_time)),
    }
}

fn scrub_embed(report: &RunReport) -> Embed {
    if !report.scrub_job_ran {
        return Embed {
            title: "Scrub Job".to_string(),
            description: Some("Scrub job did **not** run.".to_string()),
            color: Some(DID_NOT_RUN_COLOR),
            ..Embed::default()
        };
    }

    let scrub = report.status.scrub;
    let description = format!(
        "Scrub Job finished successfully :white_check_mark:\n\n\
         **{}%** of the array has not been scrubbed, with the oldest block at **{}** day(s), \
         the median at **{}** day(s), and the newest at **{}** day(s).",
        scrub.unscrubbed_percent, scrub.scrub_age_days, scrub.median_age_days, scrub.newest_age_days
    );

    Embed {
        title: "Scrub Job".to_string(),
        description: Some(description),
        color: Some(DID_RUN_COLOR),
        footer: Some(elapsed_footer(report.scrub_job_time)),
        ..Embed::default()
    }
}

fn array_embed(drives: &[DriveStat]) -> Embed {
    let fields = drives.iter().map(|drive| {
        let wasted = drive
            .wasted_gb
            .map(|gb| gb.to_string())
            .unwrap_or_else(|| "-".to_string());

        EmbedField {
            name: drive.drive_name.as_deref().unwrap_or("Full Array").to_string(),
            value: code_block(&[
                ("Total use (%)", drive.use_percent.to_string()),
                ("Fragmented Files", drive.fragmented_files.to_string()),
                ("Excess Fragments", drive.excess_fragments.to_string()),
                ("Wasted Space (GB)", wasted),
                ("Used Space (GB)", drive.used_gb.to_string()),
                ("Free Space (GB)", drive.free_gb.to_string()),
            ]),
            inline: true,
        }
    });

    Embed {
        title: "Full Array Report".to_string(),
        color: Some(DID_RUN_COLOR),
        fields: in_rows_of_two(fields.collect()),
        ..Embed::default()
    }
}

fn smart_embed(report: &RunReport) -> Embed {
    let fields = report.smart.drives.iter().map(|drive| EmbedField {
        name: smart_drive_name(drive),
        value: code_block(&[
            ("Temperature (°C)", drive.temperature_c.to_string()),
            ("Power On Time (days)", drive.power_on_days.to_string()),
            ("Error Count", drive.error_count.to_string()),
            ("Failure Probability", drive.failure_probability.to_string()),
            ("Drive Size (TiB)", drive.size.clone()),
        ]),
        inline: true,
    });

    Embed {
        title: "SMART Report".to_string(),
        description: Some(format!(
            "The current failure probability of any single drive this year is {}%.",
            report.smart.global_failure_probability
        )),
        color: Some(DID_RUN_COLOR),
        fields: in_rows_of_two(fields.collect()),
        ..Embed::default()
    }
}

fn smart_drive_name(drive: &SmartStat) -> String {
    match &drive.disk_label {
        Some(disk) => format!("{} ({}, `{}`)", disk, drive.device_path, drive.serial),
        None => format!("{} (`{}`)", drive.device_path, drive.serial),
    }
}

fn elapsed_footer(elapsed: Option<std::time::Duration>) -> EmbedFooter {
    EmbedFooter {
        text: format!("Elapsed time {}", format_optional_delta(elapsed)),
    }
}

/// Aligned `label value` lines in a code block. Spaces become non-breaking
/// so Discord keeps the alignment.
fn code_block(rows: &[(&str, String)]) -> String {
    let width = rows
        .iter()
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or(0);

    let body: String = rows
        .iter()
        .map(|(label, value)| {
            let padding = width - label.chars().count();
            format!("{}{} {}\n", label, " ".repeat(padding), value)
        })
        .collect();

    format!("```\n{}```", body).replace(' ', "\u{00A0}")
}

/// Insert a blank field after every second one so inline fields wrap in pairs
fn in_rows_of_two(fields: Vec<EmbedField>) -> Vec<EmbedField> {
    let total = fields.len();
    let mut rows = Vec::with_capacity(total + total / 2);

    for (index, field) in fields.into_iter().enumerate() {
        rows.push(field);

        if (index + 1) % 2 == 0 && index + 1 != total {
            rows.push(EmbedField {
                name: "** **".to_string(),
                value: "** **".to_string(),
                inline: false,
            });
        }
    }

    rows
}
