use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::MessageId;
use crate::error::{Result, SnapperError};

const WEBHOOK_BASE_URL: &str = "https://discord.com/api/webhooks";
const USERNAME: &str = "Snapper";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
    embeds: &'a [Embed],
    username: &'a str,
}

#[derive(Deserialize)]
struct WebhookMessage {
    id: MessageId,
}

/// Client for one Discord webhook
pub struct DiscordWebhook {
    client: reqwest::blocking::Client,
    url: String,
}

impl DiscordWebhook {
    pub fn new(webhook_id: &str, webhook_token: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("snapper/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SnapperError::notification(format!("Unable to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: webhook_url(webhook_id, webhook_token),
        })
    }

    /// Post a new message, or edit `edit` in place. A failed edit (for
    /// example a deleted message) falls back to posting a new one.
    pub fn send(&self, content: &str, embeds: &[Embed], edit: Option<&str>) -> Result<MessageId> {
        let payload = WebhookPayload {
            content,
            embeds,
            username: USERNAME,
        };

        if let Some(message_id) = edit {
            match self.edit(message_id, &payload) {
                Ok(()) => return Ok(message_id.to_string()),
                Err(e) => log::debug!("Failed to update message, posting new. ({})", e),
            }
        }

        self.post(&payload)
    }

    fn post(&self, payload: &WebhookPayload<'_>) -> Result<MessageId> {
        let response = self
            .client
            .post(format!("{}?wait=true", self.url))
            .json(payload)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| SnapperError::notification(format!("Unable to send message to discord: {}", e)))?;

        let message: WebhookMessage = response
            .json()
            .map_err(|e| SnapperError::notification(format!("Unexpected discord response: {}", e)))?;

        log::debug!("Successfully posted message to discord");

        Ok(message.id)
    }

    fn edit(&self, message_id: &str, payload: &WebhookPayload<'_>) -> Result<()> {
        self.client
            .patch(format!("{}/messages/{}", self.url, message_id))
            .json(payload)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| SnapperError::notification(format!("Unable to update discord message: {}", e)))?;

        Ok(())
    }
}

fn webhook_url(webhook_id: &str, webhook_token: &str) -> String {
    format!("{}/{}/{}", WEBHOOK_BASE_URL, webhook_id, webhook_token)
}
