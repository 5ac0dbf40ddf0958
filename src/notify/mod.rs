//! Outbound notifications: Discord webhook messages and HTML email.

pub mod discord;
pub mod email;

pub use discord::{DiscordWebhook, Embed, EmbedField, EmbedFooter};
pub use email::MailSender;

use crate::core::config::NotificationsConfig;
use crate::error::Result;

/// Identifier of a posted chat message, used to edit it later
pub type MessageId = String;

/// Delivery channels used by a run
pub trait Notifier: Send + Sync {
    /// Post a chat message, or edit `edit` in place when given.
    /// Returns the id of the message that now shows `content`, if the channel is enabled.
    fn chat(&self, content: &str, embeds: &[Embed], edit: Option<&str>) -> Result<Option<MessageId>>;

    fn email(&self, subject: &str, html_body: &str) -> Result<()>;
}

/// The configured Discord webhook and mail sender. Disabled channels are skipped.
pub struct Notifications {
    discord: Option<DiscordWebhook>,
    mail: Option<MailSender>,
}

impl Notifications {
    pub fn from_config(config: &NotificationsConfig) -> Result<Self> {
        let discord = if config.discord.enabled {
            Some(DiscordWebhook::new(
                &config.discord.webhook_id,
                &config.discord.webhook_token,
            )?)
        } else {
            None
        };

        let mail = config
            .email
            .enabled
            .then(|| MailSender::from_config(&config.email));

        Ok(Self { discord, mail })
    }
}

impl Notifier for Notifications {
    fn chat(&self, content: &str, embeds: &[Embed], edit: Option<&str>) -> Result<Option<MessageId>> {
        match &self.discord {
            Some(discord) => discord.send(content, embeds, edit).map(Some),
            None => Ok(None),
        }
    }

    fn email(&self, subject: &str, html_body: &str) -> Result<()> {
        match &self.mail {
            Some(mail) => mail.send(subject, html_body),
            None => Ok(()),
        }
    }
}

/// Post an info message. Delivery failures are logged and yield `None`.
pub fn notify_info(notifier: &dyn Notifier, message: &str, edit: Option<&str>) -> Option<MessageId> {
    let content = format!(":information_source: [**INFO**] {}", message);
    logged(notifier.chat(&content, &[], edit)).flatten()
}

/// Post a warning message. Delivery failures are logged and yield `None`.
pub fn notify_warning(notifier: &dyn Notifier, message: &str) -> Option<MessageId> {
    let content = format!(":warning: [**WARNING!**] {}", message);
    logged(notifier.chat(&content, &[], None)).flatten()
}

/// Send an email. Delivery failures are logged.
pub fn send_email(notifier: &dyn Notifier, subject: &str, html_body: &str) {
    log::debug!("Attempting to send email...");
    if logged(notifier.email(subject, html_body)).is_some() {
        log::debug!("Email sent: {}", subject);
    }
}

/// Log a delivery failure instead of propagating it
pub fn logged<T>(result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::error!("{}", e);
            None
        }
    }
}
