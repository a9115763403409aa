//! Slack incoming webhooks.
//!
//! Slack uses its own link syntax (`<url|text>`), so markdown links in the
//! canonical message are rewritten before sending.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Serialize;

use super::{post_json, DeliveryError, DeliveryReceipt, OutputAdapter};
use crate::message::CanonicalMessage;

pub const KEY: &str = "slack";

static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\[\]]*)\]\(([^()\s]+)\)").expect("markdown link pattern is valid")
});

pub struct SlackAdapter {
    client: Client,
}

impl SlackAdapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[derive(Debug, Serialize)]
struct SlackMessage<'a> {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<SlackAttachment<'a>>,
}

#[derive(Debug, Serialize)]
struct SlackAttachment<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    thumb_url: Option<&'a str>,
    fields: Vec<SlackField<'a>>,
    mrkdwn_in: [&'static str; 1],
}

#[derive(Debug, Serialize)]
struct SlackField<'a> {
    title: &'a str,
    value: String,
    short: bool,
}

/// `[text](url)` → `<url|text>`, `**bold**` → `*bold*`
pub fn slack_markdown(text: &str) -> String {
    MARKDOWN_LINK
        .replace_all(text, "<$2|$1>")
        .replace("**", "*")
}

fn to_wire(message: &CanonicalMessage) -> SlackMessage<'_> {
    let text = match message.title.as_deref() {
        Some(title) if !title.is_empty() => {
            format!("{}\n{}", message.activity, slack_markdown(title))
        }
        _ => message.activity.clone(),
    };

    SlackMessage {
        text,
        icon_url: message.icon_url.as_deref(),
        attachments: message
            .attachments
            .iter()
            .map(|attachment| SlackAttachment {
                thumb_url: attachment.thumbnail_url.as_deref(),
                fields: attachment
                    .fields
                    .iter()
                    .map(|field| SlackField {
                        title: &field.title,
                        value: slack_markdown(&field.value),
                        short: field.short,
                    })
                    .collect(),
                mrkdwn_in: ["fields"],
            })
            .collect(),
    }
}

#[async_trait]
impl OutputAdapter for SlackAdapter {
    fn key(&self) -> &str {
        KEY
    }

    async fn deliver(
        &self,
        destination: &str,
        message: &CanonicalMessage,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        post_json(&self.client, destination, &to_wire(message)).await
    }
}
