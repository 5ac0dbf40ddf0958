use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::core::config::EmailConfig;
use crate::core::process;
use crate::error::{Result, SnapperError};

/// Sends HTML email through a `mail`-compatible binary
pub struct MailSender {
    binary: PathBuf,
    from_email: String,
    to_email: String,
}

impl MailSender {
    pub fn from_config(config: &EmailConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            from_email: config.from_email.clone(),
            to_email: config.to_email.clone(),
        }
    }

    fn arguments<'a>(&'a self, subject: &'a str) -> [&'a str; 7] {
        [
            "-a",
            "Content-Type: text/html",
            "-s",
            subject,
            "-r",
            &self.from_email,
            &self.to_email,
        ]
    }

    /// Pipe `html_body` into the mail binary. Any stderr output counts as failure.
    pub fn send(&self, subject: &str, html_body: &str) -> Result<()> {
        let binary = process::resolve_binary(&self.binary).ok_or_else(|| {
            SnapperError::notification(format!(
                "Unable to find mail executable - missing file path `{}`",
                self.binary.display()
            ))
        })?;

        let mut child = Command::new(binary)
            .args(self.arguments(subject))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(html_body.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !stderr.trim().is_empty() || !output.status.success() {
            return Err(SnapperError::notification(format!(
                "Unable to send email: {}",
                stderr.trim()
            )));
        }

        log::debug!("Successfully sent email to {}", self.to_email);

        Ok(())
    }
}
