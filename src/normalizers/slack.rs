//! Slack-compatible incoming webhooks.
//!
//! Lets any tool that can already post to a Slack incoming webhook be pointed
//! at the relay instead. The first line of `text` becomes the activity and the
//! rest the title; Slack's `<url|text>` links are turned back into markdown.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Deserialize;

use super::{null_as_default, NormalizeError, Normalizer};
use crate::message::{linkify_url, Attachment, CanonicalMessage, Field};

pub const DISPLAY_NAME: &str = "Slack";

static SLACK_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<((?:https?|mailto):[^|>\s]+)(?:\|([^>]*))?>").expect("slack link pattern is valid")
});

pub struct Slack;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SlackMessage {
    #[serde(deserialize_with = "null_as_default")]
    text: String,
    #[serde(deserialize_with = "null_as_default")]
    username: String,
    #[serde(deserialize_with = "null_as_default")]
    icon_url: String,
    #[serde(deserialize_with = "null_as_default")]
    attachments: Vec<SlackAttachment>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SlackAttachment {
    #[serde(deserialize_with = "null_as_default")]
    title: String,
    #[serde(deserialize_with = "null_as_default")]
    title_link: String,
    #[serde(deserialize_with = "null_as_default")]
    text: String,
    #[serde(deserialize_with = "null_as_default")]
    thumb_url: String,
    #[serde(deserialize_with = "null_as_default")]
    fields: Vec<SlackField>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SlackField {
    #[serde(deserialize_with = "null_as_default")]
    title: String,
    #[serde(deserialize_with = "null_as_default")]
    value: String,
    #[serde(deserialize_with = "null_as_default")]
    short: bool,
}

/// `<url|text>` → `[text](url)`, `<url>` → `[url](url)`. Mentions such as
/// `<@U123>` or `<!here>` are left alone.
pub fn markdown_from_slack(text: &str) -> String {
    SLACK_LINK
        .replace_all(text, |caps: &Captures| {
            let url = &caps[1];
            let label = caps.get(2).map_or("", |m| m.as_str());
            linkify_url(label, url)
        })
        .into_owned()
}

impl Normalizer for Slack {
    fn display_name(&self) -> &str {
        DISPLAY_NAME
    }

    fn normalize(&self, body: &[u8]) -> Result<CanonicalMessage, NormalizeError> {
        let src: SlackMessage = serde_json::from_slice(body)?;
        build_message(src)
    }
}

fn build_message(src: SlackMessage) -> Result<CanonicalMessage, NormalizeError> {
    let mut message = CanonicalMessage::new();

    let text = markdown_from_slack(src.text.trim());
    let (activity, rest) = text.split_once('\n').unwrap_or((text.as_str(), ""));
    message.activity = match (activity.trim(), src.username.trim()) {
        ("", "") => String::new(),
        ("", username) => username.to_string(),
        (activity, _) => activity.to_string(),
    };
    let rest = rest.trim();
    if !rest.is_empty() {
        message.title = Some(rest.to_string());
    }
    if !src.icon_url.is_empty() {
        message.icon_url = Some(src.icon_url);
    }

    for source in src.attachments {
        let mut attachment = Attachment::new();
        if !source.thumb_url.is_empty() {
            attachment.thumbnail_url = Some(source.thumb_url);
        }
        if !source.text.is_empty() {
            attachment.add_field(Field::new(
                linkify_url(&source.title, &source.title_link),
                markdown_from_slack(&source.text),
            ));
        }
        for field in source.fields {
            if field.title.is_empty() && field.value.is_empty() {
                continue;
            }
            let value = markdown_from_slack(&field.value);
            attachment.add_field(if field.short {
                Field::short(field.title, value)
            } else {
                Field::new(field.title, value)
            });
        }
        if !attachment.fields.is_empty() {
            message.add_attachment(attachment);
        }
    }

    if message.activity.is_empty() && message.attachments.is_empty() {
        return Err(NormalizeError::Invalid(
            "message has no text, username or attachments".to_string(),
        ));
    }
    Ok(message)
}
