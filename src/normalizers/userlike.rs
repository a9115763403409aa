//! Userlike outbound webhooks.
//!
//! Userlike posts every event kind to the same endpoint, so the body is read
//! twice: first as a small envelope carrying `_type` and `_event`, then as the
//! full schema for that kind.

use serde::Deserialize;

use super::{null_as_default, NormalizeError, Normalizer};
use crate::message::{integration_activity_suffix, linkify_url, Attachment, CanonicalMessage, Field};

pub const DISPLAY_NAME: &str = "Userlike";
pub const ICON_URL: &str = "https://a.slack-edge.com/ae7f/img/services/userlike_512.png";

pub struct Userlike;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Envelope {
    #[serde(rename = "_type", deserialize_with = "null_as_default")]
    kind: String,
    #[serde(rename = "_event", deserialize_with = "null_as_default")]
    event: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct OfflineMessage {
    #[serde(deserialize_with = "null_as_default")]
    client_name: String,
    #[serde(deserialize_with = "null_as_default")]
    client_email: String,
    #[serde(deserialize_with = "null_as_default")]
    message: String,
    #[serde(deserialize_with = "null_as_default")]
    topic: String,
    #[serde(deserialize_with = "null_as_default")]
    url: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ChatMeta {
    #[serde(rename = "_event", deserialize_with = "null_as_default")]
    event: String,
    #[serde(deserialize_with = "null_as_default")]
    client_name: String,
    #[serde(deserialize_with = "null_as_default")]
    feedback_message: String,
    #[serde(deserialize_with = "null_as_default")]
    post_survey_option: String,
    #[serde(deserialize_with = "null_as_default")]
    url: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Operator {
    #[serde(rename = "_event", deserialize_with = "null_as_default")]
    event: String,
    #[serde(deserialize_with = "null_as_default")]
    name: String,
    #[serde(deserialize_with = "null_as_default")]
    dashboard_url: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ChatWidget {
    #[serde(deserialize_with = "null_as_default")]
    name: String,
    #[serde(deserialize_with = "null_as_default")]
    custom_url: String,
    #[serde(deserialize_with = "null_as_default")]
    status_url: String,
    #[serde(deserialize_with = "null_as_default")]
    test_url: String,
    #[serde(deserialize_with = "null_as_default")]
    widget_external_type: String,
    widget_version: Option<i64>,
}

impl Normalizer for Userlike {
    fn display_name(&self) -> &str {
        DISPLAY_NAME
    }

    fn normalize(&self, body: &[u8]) -> Result<CanonicalMessage, NormalizeError> {
        let envelope: Envelope = serde_json::from_slice(body)?;

        match (envelope.kind.as_str(), envelope.event.as_str()) {
            ("offline_message", "receive") => {
                Ok(offline_message(serde_json::from_slice(body)?))
            }
            ("chat_meta", _) => Ok(chat_meta(serde_json::from_slice(body)?)),
            ("operator", _) => Ok(operator(serde_json::from_slice(body)?)),
            ("chat_widget", _) => Ok(chat_widget(serde_json::from_slice(body)?)),
            (kind, event) => Err(NormalizeError::UnsupportedEvent(format!(
                "_type={kind:?} _event={event:?}"
            ))),
        }
    }
}

fn new_message(activity: &str) -> CanonicalMessage {
    let mut message = CanonicalMessage::new();
    message.icon_url = Some(ICON_URL.to_string());
    message.activity = format!("{activity}{}", integration_activity_suffix(DISPLAY_NAME));
    message
}

fn new_attachment() -> Attachment {
    let mut attachment = Attachment::new();
    attachment.thumbnail_url = Some(ICON_URL.to_string());
    attachment
}

fn push_if_filled(message: &mut CanonicalMessage, attachment: Attachment) {
    if !attachment.fields.is_empty() {
        message.add_attachment(attachment);
    }
}

/// Chat-meta events share one page URL; only the first field that renders it
/// becomes a link, later ones stay plain.
#[derive(Default)]
struct LinkOnce {
    linked: bool,
}

impl LinkOnce {
    fn render(&mut self, label: &str, url: &str) -> String {
        if self.linked {
            let plain = if label.is_empty() { url } else { label };
            return plain.to_string();
        }
        if !url.is_empty() {
            self.linked = true;
        }
        linkify_url(label, url)
    }
}

fn chat_activity(event: &str, feedback: &str) -> String {
    let phrase = match event {
        "rating" if !feedback.is_empty() => "feedback received",
        "start" => "session started",
        "forward" => "session forwarded",
        "rating" => "rating received",
        "feedback" => "feedback received",
        "survey" => "survey received",
        "receive" => "session ended",
        "goal" => "goal achieved",
        other => other,
    };
    format!("Chat {phrase}")
}

fn offline_message(src: OfflineMessage) -> CanonicalMessage {
    let mut message = new_message("Offline message received");
    let mut attachment = new_attachment();

    let body = linkify_url(&src.message, &src.url);
    if !body.is_empty() {
        attachment.add_field(Field::new("Message", body));
    }
    if !src.topic.is_empty() {
        attachment.add_field(Field::short("Topic", src.topic));
    }
    if !src.client_name.is_empty() {
        attachment.add_field(Field::short("Client Name", src.client_name));
    }
    if !src.client_email.is_empty() {
        attachment.add_field(Field::short("Client Email", src.client_email));
    }

    push_if_filled(&mut message, attachment);
    message
}

fn chat_meta(src: ChatMeta) -> CanonicalMessage {
    let mut message = new_message(&chat_activity(&src.event, &src.feedback_message));
    let mut attachment = new_attachment();
    let mut links = LinkOnce::default();

    if src.event == "rating" || src.event == "survey" {
        if !src.feedback_message.is_empty() {
            attachment.add_field(Field::new(
                "Feedback",
                links.render(&src.feedback_message, &src.url),
            ));
        }
        if !src.post_survey_option.is_empty() {
            attachment.add_field(Field::short(
                "Rating",
                links.render(&src.post_survey_option, &src.url),
            ));
        }
    }

    let client = if src.client_name.is_empty() {
        "Unknown"
    } else {
        src.client_name.as_str()
    };
    attachment.add_field(Field::short("Client Name", links.render(client, &src.url)));

    push_if_filled(&mut message, attachment);
    message
}

fn operator(src: Operator) -> CanonicalMessage {
    let mut message = new_message(&format!("Operator is {}", src.event));
    let mut attachment = Attachment::new();

    let operator = linkify_url(&src.name, &src.dashboard_url);
    if !operator.is_empty() {
        attachment.add_field(Field::new("Operator", operator));
    }

    push_if_filled(&mut message, attachment);
    message
}

fn chat_widget(src: ChatWidget) -> CanonicalMessage {
    let mut message = new_message("Chat widget configuration updated");

    let mut title_parts = Vec::new();
    if !src.status_url.is_empty() {
        title_parts.push(format!("[Check status]({})", src.status_url));
    }
    if !src.test_url.is_empty() {
        title_parts.push(format!("[test widget]({})", src.test_url));
    }
    if !title_parts.is_empty() {
        message.title = Some(title_parts.join(" and "));
    }

    let mut attachment = new_attachment();
    if !src.name.is_empty() {
        attachment.add_field(Field::short(
            "Widget Name",
            linkify_url(&src.name, &src.custom_url),
        ));
    }
    if let Some(version) = src.widget_version {
        attachment.add_field(Field::short("Widget Version", version.to_string()));
    }
    if !src.widget_external_type.is_empty() {
        attachment.add_field(Field::short("Widget Type", src.widget_external_type));
    }

    push_if_filled(&mut message, attachment);
    message
}
