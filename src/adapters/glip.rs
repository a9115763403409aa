//! Glip (RingCentral) incoming webhooks.
//!
//! Glip renders markdown links natively, so field values pass through as-is.
//! Attachments become cards whose fields carry a `Short`/`Long` style.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{post_json, DeliveryError, DeliveryReceipt, OutputAdapter};
use crate::message::CanonicalMessage;

pub const KEY: &str = "glip";

pub struct GlipAdapter {
    client: Client,
}

impl GlipAdapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[derive(Debug, Serialize)]
struct GlipMessage<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    icon: Option<&'a str>,
    activity: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<GlipCard<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GlipCard<'a> {
    #[serde(rename = "type")]
    card_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    thumbnail_uri: Option<&'a str>,
    fields: Vec<GlipField<'a>>,
}

#[derive(Debug, Serialize)]
struct GlipField<'a> {
    title: &'a str,
    value: &'a str,
    style: &'static str,
}

fn to_wire(message: &CanonicalMessage) -> GlipMessage<'_> {
    GlipMessage {
        icon: message.icon_url.as_deref(),
        activity: &message.activity,
        title: message.title.as_deref(),
        attachments: message
            .attachments
            .iter()
            .map(|attachment| GlipCard {
                card_type: "Card",
                thumbnail_uri: attachment.thumbnail_url.as_deref(),
                fields: attachment
                    .fields
                    .iter()
                    .map(|field| GlipField {
                        title: &field.title,
                        value: &field.value,
                        style: if field.short { "Short" } else { "Long" },
                    })
                    .collect(),
            })
            .collect(),
    }
}

#[async_trait]
impl OutputAdapter for GlipAdapter {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Attachment, Field};
    use serde_json::json;

    fn sample() -> CanonicalMessage {
        let mut attachment = Attachment::new();
        attachment.thumbnail_url = Some("https://thumb".to_string());
        attachment.add_field(Field::short("Branch", "main"));
        attachment.add_field(Field::new("Message", "[Fix](https://c)"));

        let mut message = CanonicalMessage::new();
        message.activity = "Build passed via Travis CI".to_string();
        message.icon_url = Some("https://icon".to_string());
        message.add_attachment(attachment);
        message
    }

    #[test]
    fn test_wire_format() {
        let wire = serde_json::to_value(to_wire(&sample())).unwrap();
        assert_eq!(
            wire,
            json!({
                "icon": "https://icon",
                "activity": "Build passed via Travis CI",
                "attachments": [{
                    "type": "Card",
                    "thumbnailUri": "https://thumb",
                    "fields": [
                        {"title": "Branch", "value": "main", "style": "Short"},
                        {"title": "Message", "value": "[Fix](https://c)", "style": "Long"}
                    ]
                }]
            })
        );
    }

    #[test]
    fn test_bare_message_omits_optional_keys() {
        let mut message = CanonicalMessage::new();
        message.activity = "Operator is away".to_string();
        let wire = serde_json::to_value(to_wire(&message)).unwrap();
        assert_eq!(wire, json!({"activity": "Operator is away"}));
    }

    #[tokio::test]
    async fn test_deliver_posts_to_destination() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/webhook/abc")
            .match_body(mockito::Matcher::PartialJson(json!({
                "activity": "Build passed via Travis CI"
            })))
            .with_status(200)
            .with_body(r#"{"status":"OK"}"#)
            .create_async()
            .await;

        let adapter = GlipAdapter::new(Client::new());
        let receipt = adapter
            .deliver(&format!("{}/webhook/abc", server.url()), &sample())
            .await
            .unwrap();

        assert_eq!(receipt.status, 200);
        assert_eq!(receipt.body, r#"{"status":"OK"}"#);
        mock.assert_async().await;
    }
}
