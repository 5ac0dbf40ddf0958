// Shared fakes and fixtures for the integration tests

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use snapper::core::config::{Config, SnapraidConfig};
use snapper::core::runner::{ArrayTool, CommandOutput, LineClassifier};
use snapper::notify::{Embed, MessageId, Notifier};
use snapper::{Result, SnapperError};

pub const STATUS_CLEAN: &str = "\
SnapRAID status report:

   Files Fragmented Excess  Wasted  Used    Free  Use Name
            Files  Fragments  GB      GB      GB
   29164     331     1810     0.3    2663     287  90% d1
   37046     210     2196       -    2632     318  89% d2
 --------------------------------------------------------------------------
   66210     541     4006     0.3    5295     605  89%

The oldest block was scrubbed 63 days ago, the median 11, the newest 0.

No sync is in progress.
The 48% of the array is not scrubbed.
No rehash is in progress or needed.
No error detected.
";

pub const SMART: &str = "\
SnapRAID SMART report:

   Temp  Power   Error   FP Size
      C OnDays   Count        TB  Serial           Device    Disk
 -----------------------------------------------------------------------
     38    1175       0   5%  4.0  WD-WCC4E1234567  /dev/sdb  d1
     40     876       2  SSD  0.5  S3Z9NB0K123456A  /dev/sdc  d2
      -       -       -    -  8.0  ZA1234567        /dev/sdd  -
 -----------------------------------------------------------------------

Probability that at least one disk is going to fail in the next year is 9%.
";

pub fn status_with(extra: &str) -> String {
    format!("{}{}\n", STATUS_CLEAN, extra)
}

pub fn diff_output(added: u64, removed: u64, updated: u64) -> String {
    format!(
        "Comparing...\n\n   81234 equal\n   {} added\n   {} removed\n   {} updated\n   0 moved\n   0 copied\n   0 restored\n",
        added, removed, updated
    )
}

pub fn ok(stdout: &str) -> Result<CommandOutput> {
    Ok(CommandOutput {
        stdout: stdout.to_string(),
        stderr: String::new(),
    })
}

pub fn tool_failure(command: &str, stderr: &str) -> Result<CommandOutput> {
    Err(SnapperError::CriticalToolFailure {
        command: command.to_string(),
        exit_code: Some(1),
        stderr: stderr.to_string(),
    })
}

/// Scripted array tool. Responses are queued per command line; the last
/// queued response for a command is repeated once the queue runs dry.
#[derive(Default)]
pub struct FakeTool {
    responses: Mutex<HashMap<String, VecDeque<Result<CommandOutput>>>>,
    fallback: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<String>>,
}

impl FakeTool {
    /// A tool with a clean status, no diff changes and a SMART report
    pub fn healthy() -> Self {
        let tool = Self::default();
        tool.always("status", STATUS_CLEAN);
        tool.always("diff", &diff_output(0, 0, 0));
        tool.always("smart", SMART);
        tool.always("touch", "");
        tool
    }

    /// Answer every call of `command` with `stdout`
    pub fn always(&self, command: &str, stdout: &str) {
        self.fallback
            .lock()
            .insert(command.to_string(), stdout.to_string());
    }

    /// Answer the next call of `command` with `response`
    pub fn queue(&self, command: &str, response: Result<CommandOutput>) {
        self.responses
            .lock()
            .entry(command.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, command: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == command).count()
    }
}

impl ArrayTool for FakeTool {
    fn run(
        &self,
        args: &[&str],
        mut classifier: Option<&mut LineClassifier<'_>>,
        _acceptable_exit_codes: &[i32],
    ) -> Result<CommandOutput> {
        let command = args.join(" ");
        self.calls.lock().push(command.clone());

        let queued = self
            .responses
            .lock()
            .get_mut(&command)
            .and_then(|queue| queue.pop_front());

        let output = match queued {
            Some(response) => response?,
            None => {
                let stdout = self
                    .fallback
                    .lock()
                    .get(&command)
                    .cloned()
                    .unwrap_or_default();
                CommandOutput {
                    stdout,
                    stderr: String::new(),
                }
            }
        };

        let kept: Vec<&str> = output
            .stdout
            .lines()
            .filter(|&line| match classifier.as_deref_mut() {
                Some(classify) => !classify(line),
                None => true,
            })
            .collect();

        Ok(CommandOutput {
            stdout: kept.join("\n"),
            stderr: output.stderr.clone(),
        })
    }
}

/// Notifier that records every chat post and email
#[derive(Default)]
pub struct RecordingNotifier {
    pub chats: Mutex<Vec<(String, usize, Option<String>)>>,
    pub emails: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn chat_texts(&self) -> Vec<String> {
        self.chats.lock().iter().map(|(text, _, _)| text.clone()).collect()
    }

    pub fn email_subjects(&self) -> Vec<String> {
        self.emails.lock().iter().map(|(subject, _)| subject.clone()).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn chat(&self, content: &str, embeds: &[Embed], edit: Option<&str>) -> Result<Option<MessageId>> {
        let mut chats = self.chats.lock();
        chats.push((content.to_string(), embeds.len(), edit.map(str::to_string)));
        Ok(Some(
            edit.map(str::to_string)
                .unwrap_or_else(|| format!("message-{}", chats.len())),
        ))
    }

    fn email(&self, subject: &str, html_body: &str) -> Result<()> {
        self.emails
            .lock()
            .push((subject.to_string(), html_body.to_string()));
        Ok(())
    }
}

/// A temp dir holding a `snapraid.conf` whose content and parity files exist
pub struct ArrayFixture {
    pub dir: TempDir,
    pub config: Config,
}

impl ArrayFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("snapraid.content");
        let parity = dir.path().join("snapraid.parity");
        fs::write(&content, "").unwrap();
        fs::write(&parity, "").unwrap();

        let snapraid_conf = dir.path().join("snapraid.conf");
        fs::write(
            &snapraid_conf,
            format!(
                "parity {}\ncontent {}\ndata d1 /mnt/disk1/\n",
                parity.display(),
                content.display()
            ),
        )
        .unwrap();

        let config = Config {
            snapraid: SnapraidConfig {
                config: snapraid_conf,
                ..SnapraidConfig::default()
            },
            pid_file: dir.path().join("snapper.pid"),
            ..Config::default()
        };

        Self { dir, config }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}
