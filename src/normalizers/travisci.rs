use serde::Deserialize;

use super::{null_as_default, NormalizeError, Normalizer};
use crate::message::{integration_activity_suffix, linkify_url, Attachment, CanonicalMessage, Field};

pub const DISPLAY_NAME: &str = "Travis CI";
pub const ICON_URL: &str = "https://a.slack-edge.com/0180/img/services/travis_512.png";

pub struct TravisCi;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BuildNotification {
    #[serde(deserialize_with = "null_as_default")]
    number: String,
    #[serde(deserialize_with = "null_as_default")]
    status_message: String,
    #[serde(deserialize_with = "null_as_default")]
    build_url: String,
    #[serde(deserialize_with = "null_as_default")]
    branch: String,
    #[serde(deserialize_with = "null_as_default")]
    commit: String,
    #[serde(deserialize_with = "null_as_default")]
    compare_url: String,
    #[serde(deserialize_with = "null_as_default")]
    message: String,
    #[serde(deserialize_with = "null_as_default")]
    committer_name: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    event_type: String,
    duration: Option<u64>,
    #[serde(deserialize_with = "null_as_default")]
    repository: Repository,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Repository {
    #[serde(deserialize_with = "null_as_default")]
    name: String,
    #[serde(deserialize_with = "null_as_default")]
    owner_name: String,
    #[serde(deserialize_with = "null_as_default")]
    url: String,
}

impl Repository {
    fn slug(&self) -> String {
        match (self.owner_name.is_empty(), self.name.is_empty()) {
            (false, false) => format!("{}/{}", self.owner_name, self.name),
            (true, _) => self.name.clone(),
            (false, true) => self.owner_name.clone(),
        }
    }
}

impl Normalizer for TravisCi {
    fn display_name(&self) -> &str {
        DISPLAY_NAME
    }

    fn normalize(&self, body: &[u8]) -> Result<CanonicalMessage, NormalizeError> {
        let json = payload_json(body)?;
        let src: BuildNotification = serde_json::from_str(&json)?;
        Ok(build_message(src))
    }
}

/// Travis posts `payload=<urlencoded json>` as a form; plain JSON bodies are
/// accepted too.
fn payload_json(body: &[u8]) -> Result<String, NormalizeError> {
    let text = std::str::from_utf8(body)
        .map_err(|e| NormalizeError::Invalid(format!("body is not UTF-8: {e}")))?
        .trim();

    if text.starts_with('{') {
        return Ok(text.to_string());
    }

    let encoded = text
        .split('&')
        .find_map(|pair| pair.strip_prefix("payload="))
        .ok_or_else(|| NormalizeError::Invalid("missing payload form parameter".to_string()))?;

    urlencoding::decode(&encoded.replace('+', " "))
        .map(|decoded| decoded.into_owned())
        .map_err(|e| NormalizeError::Invalid(format!("payload is not valid URL encoding: {e}")))
}

fn status_phrase(status_message: &str) -> &str {
    match status_message.to_ascii_lowercase().as_str() {
        "pending" => "pending",
        "passed" => "passed",
        "fixed" => "fixed",
        "broken" => "broken",
        "failed" => "failed",
        "still failing" => "still failing",
        "canceled" => "canceled",
        "errored" => "errored",
        "" => "notification",
        _ => status_message,
    }
}

fn format_duration(secs: u64) -> String {
    let mins = secs / 60;
    let remaining_secs = secs % 60;
    if mins > 0 {
        format!("{}m {}s", mins, remaining_secs)
    } else {
        format!("{}s", secs)
    }
}

fn build_message(src: BuildNotification) -> CanonicalMessage {
    let mut message = CanonicalMessage::new();
    message.icon_url = Some(ICON_URL.to_string());
    message.activity = format!(
        "Build {}{}",
        status_phrase(&src.status_message),
        integration_activity_suffix(DISPLAY_NAME)
    );

    let slug = src.repository.slug();
    if !src.number.is_empty() {
        let build = linkify_url(&format!("Build #{}", src.number), &src.build_url);
        message.title = Some(if slug.is_empty() {
            build
        } else {
            format!("{build} for **{slug}**")
        });
    }

    let mut attachment = Attachment::new();
    attachment.thumbnail_url = Some(ICON_URL.to_string());

    let repository = linkify_url(&slug, &src.repository.url);
    if !repository.is_empty() {
        attachment.add_field(Field::short("Repository", repository));
    }
    if !src.branch.is_empty() {
        attachment.add_field(Field::short("Branch", src.branch.clone()));
    }
    if !src.commit.is_empty() {
        let short_sha: String = src.commit.chars().take(7).collect();
        attachment.add_field(Field::short("Commit", linkify_url(&short_sha, &src.compare_url)));
    }
    if !src.committer_name.is_empty() {
        attachment.add_field(Field::short("Committer", src.committer_name));
    }
    if !src.event_type.is_empty() {
        attachment.add_field(Field::short("Type", src.event_type.replace('_', " ")));
    }
    if let Some(secs) = src.duration.filter(|&s| s > 0) {
        attachment.add_field(Field::short("Duration", format_duration(secs)));
    }
    if !src.message.is_empty() {
        attachment.add_field(Field::new("Message", src.message));
    }

    if !attachment.fields.is_empty() {
        message.add_attachment(attachment);
    }
    message
}
