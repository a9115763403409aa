use serde::{Deserialize, Serialize};

/// A platform-neutral chat notification produced by a normalizer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CanonicalMessage {
    /// Short summary line, e.g. "Chat session started via Userlike"
    pub activity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    /// Display order is insertion order
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl CanonicalMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_attachment(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Attachment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field. Duplicate titles are allowed.
    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Field {
    pub title: String,
    pub value: String,
    /// Render inline rather than full width
    #[serde(default)]
    pub short: bool,
}

impl Field {
    pub fn new(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            short: false,
        }
    }

    pub fn short(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            short: true,
            ..Self::new(title, value)
        }
    }
}

/// Render a label and URL as a markdown link.
///
/// Falls back to the bare URL as its own label, or to the plain label when
/// there is no URL. Returns an empty string when both are empty; callers
/// omit the field in that case.
pub fn linkify_url(label: &str, url: &str) -> String {
    match (label.is_empty(), url.is_empty()) {
        (_, true) => label.to_string(),
        (true, false) => format!("[{url}]({url})"),
        (false, false) => format!("[{label}]({url})"),
    }
}

/// Suffix appended to activity lines, e.g. " via Userlike".
pub fn integration_activity_suffix(display_name: &str) -> String {
    if display_name.is_empty() {
        String::new()
    } else {
        format!(" via {display_name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linkify_label_and_url() {
        assert_eq!(linkify_url("Acme", "http://x"), "[Acme](http://x)");
    }

    #[test]
    fn test_linkify_url_only() {
        assert_eq!(linkify_url("", "http://x"), "[http://x](http://x)");
    }

    #[test]
    fn test_linkify_label_only() {
        assert_eq!(linkify_url("Acme", ""), "Acme");
    }

    #[test]
    fn test_linkify_both_empty() {
        assert_eq!(linkify_url("", ""), "");
    }

    #[test]
    fn test_activity_suffix() {
        assert_eq!(integration_activity_suffix("Userlike"), " via Userlike");
        assert_eq!(integration_activity_suffix(""), "");
    }

    #[test]
    fn test_fields_keep_insertion_order_and_duplicates() {
        let mut attachment = Attachment::new();
        attachment.add_field(Field::new("Name", "a"));
        attachment.add_field(Field::short("Name", "b"));
        attachment.add_field(Field::new("Other", "c"));

        let titles: Vec<&str> = attachment.fields.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["Name", "Name", "Other"]);
        assert!(!attachment.fields[0].short);
        assert!(attachment.fields[1].short);
    }

    #[test]
    fn test_message_without_attachments_is_valid() {
        let mut message = CanonicalMessage::new();
        message.activity = "Build passed".to_string();
        assert!(message.attachments.is_empty());
        assert!(message.title.is_none());
    }
}
