// Discord and email report formatting

use super::support::{SMART, STATUS_CLEAN};
use std::time::Duration;

use snapper::core::job::RunReport;
use snapper::core::parsers::{parse_smart, parse_status, DiffStat};
use snapper::ui::discord_report::{DID_NOT_RUN_COLOR, DID_RUN_COLOR};
use snapper::ui::{create_discord_report, create_email_report};

fn report(sync_job_ran: bool, scrub_job_ran: bool) -> RunReport {
    RunReport {
        sync_job_ran,
        scrub_job_ran,
        sync_job_time: sync_job_ran.then(|| Duration::from_secs(3725)),
        scrub_job_time: scrub_job_ran.then(|| Duration::from_secs(59)),
        diff: DiffStat {
            equal: 100,
            added: 7,
            removed: 2,
            updated: 1,
            ..DiffStat::default()
        },
        zero_subsecond_count: 0,
        status: parse_status(STATUS_CLEAN).unwrap(),
        smart: parse_smart(SMART).unwrap(),
        total_time: Duration::from_secs(3800),
    }
}

#[test]
fn test_discord_report_layout() {
    let (message, embeds) = create_discord_report(&report(true, false));

    assert_eq!(
        message,
        ":turtle: SnapRAID job completed successfully in **01h 03m 20s**"
    );

    let titles: Vec<&str> = embeds.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Touch Job", "Sync Job", "Scrub Job", "Full Array Report", "SMART Report"]
    );

    assert_eq!(embeds[0].color, Some(DID_NOT_RUN_COLOR));

    let sync = &embeds[1];
    assert_eq!(sync.color, Some(DID_RUN_COLOR));
    assert_eq!(sync.fields.len(), 6);
    assert_eq!(sync.fields[0].name, "Added");
    assert_eq!(sync.fields[0].value, "```7```");
    assert_eq!(
        sync.footer.as_ref().map(|f| f.text.as_str()),
        Some("Elapsed time 01h 02m 05s")
    );

    assert_eq!(
        embeds[2].description.as_deref(),
        Some("Scrub job did **not** run.")
    );
}

#[test]
fn test_array_report_marks_full_array_and_pairs_fields() {
    let (_, embeds) = create_discord_report(&report(false, false));
    let names: Vec<&str> = embeds[3].fields.iter().map(|f| f.name.as_str()).collect();

    assert_eq!(names, vec!["d1", "d2", "** **", "Full Array"]);
    assert!(embeds[3].fields[1].value.contains("Wasted\u{00A0}Space\u{00A0}(GB)\u{00A0}-"));
}

#[test]
fn test_smart_report_names_drives() {
    let (_, embeds) = create_discord_report(&report(false, false));
    let smart = &embeds[4];

    assert_eq!(
        smart.description.as_deref(),
        Some("The current failure probability of any single drive this year is 9%.")
    );
    let names: Vec<&str> = smart.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "d1 (/dev/sdb, `WD-WCC4E1234567`)",
            "d2 (/dev/sdc, `S3Z9NB0K123456A`)",
            "** **",
            "/dev/sdd (`ZA1234567`)",
        ]
    );
}

#[test]
fn test_email_report_contains_every_section() {
    let html = create_email_report(&report(true, true));

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<h2>[Snapper] SnapRAID job completed successfully in 01h 03m 20s</h2>"));
    assert!(html.contains("<p>No zero sub-second files were found.</p>"));
    assert!(html.contains("<li>7 added</li>"));
    assert!(html.contains("Job finished successfully in <strong>00h 00m 59s</strong>"));
    assert!(html.contains("<tr class=\"array_stats\"><td>Full Array</td>"));
    assert!(html.contains("<td>d2</td><td>210</td><td>2196</td><td>-</td>"));
    assert!(html.contains("<td>d1 (/dev/sdb)</td>"));
    assert!(html.contains("<td>SSD</td>"));
    assert!(html.contains("this year is <strong>9%</strong>"));
}

#[test]
fn test_email_report_when_jobs_did_not_run() {
    let html = create_email_report(&report(false, false));

    assert!(html.contains("<p>Sync Job did <strong>not</strong> run.</p>"));
    assert!(html.contains("<p>Scrub Job did <strong>not</strong> run.</p>"));
}

#[test]
fn test_email_report_writes_one_row_per_drive() {
    let report = report(true, true);
    let html = create_email_report(&report);

    let rows = html
        .lines()
        .filter(|line| line.starts_with("<tr") && line.ends_with("</td></tr>"))
        .count();
    assert_eq!(rows, report.status.drives.len() + report.smart.drives.len());
}
