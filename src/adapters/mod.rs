pub mod glip;
pub mod slack;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::message::CanonicalMessage;

pub use glip::GlipAdapter;
pub use slack::SlackAdapter;

/// What the destination webhook answered. The body is kept for diagnostics
/// and never parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryReceipt {
    pub status: u16,
    pub body: String,
}

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("destination returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("delivery timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl DeliveryError {
    /// Remote status code, when the destination answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            DeliveryError::Rejected { status, .. } => Some(*status),
            DeliveryError::Network(e) => e.status().map(|s| s.as_u16()),
            DeliveryError::Timeout(_) => None,
        }
    }

    pub fn body(&self) -> String {
        match self {
            DeliveryError::Rejected { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }
}

/// Delivers canonical messages to one chat platform's incoming webhook.
///
/// Each adapter owns its platform's wire format and makes exactly one POST
/// per call. Retrying is left to the caller.
#[async_trait]
pub trait OutputAdapter: Send + Sync {
    /// Registry key, e.g. "glip"
    fn key(&self) -> &str;

    async fn deliver(
        &self,
        destination: &str,
        message: &CanonicalMessage,
    ) -> Result<DeliveryReceipt, DeliveryError>;
}

/// POST a JSON body and classify the answer. Anything at or above 300 is a
/// failure.
pub(crate) async fn post_json<T: Serialize + ?Sized>(
    client: &Client,
    destination: &str,
    payload: &T,
) -> Result<DeliveryReceipt, DeliveryError> {
    let response = client.post(destination).json(payload).send().await?;

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    debug!(status, "Webhook destination responded");

    if status >= 300 {
        return Err(DeliveryError::Rejected { status, body });
    }

    Ok(DeliveryReceipt { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_post_json_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::Json(serde_json::json!({"a": 1})))
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let url = format!("{}/hook", server.url());
        let receipt = post_json(&Client::new(), &url, &serde_json::json!({"a": 1}))
            .await
            .unwrap();

        assert_eq!(receipt, DeliveryReceipt { status: 200, body: "ok".to_string() });
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_json_redirect_is_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/hook")
            .with_status(302)
            .with_body("moved")
            .create_async()
            .await;

        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();
        let url = format!("{}/hook", server.url());
        let err = post_json(&client, &url, &serde_json::json!({})).await.unwrap_err();

        assert_eq!(err.status(), Some(302));
        assert_eq!(err.body(), "moved");
    }

    #[tokio::test]
    async fn test_post_json_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/hook")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let url = format!("{}/hook", server.url());
        let err = post_json(&Client::new(), &url, &serde_json::json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, DeliveryError::Rejected { status: 500, .. }));
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_post_json_network_failure() {
        // Nothing listens on port 9 of the loopback interface
        let err = post_json(&Client::new(), "http://127.0.0.1:9/hook", &serde_json::json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, DeliveryError::Network(_)));
        assert_eq!(err.status(), None);
        assert!(err.body().starts_with("request failed"));
    }

    #[test]
    fn test_timeout_message() {
        let err = DeliveryError::Timeout(Duration::from_secs(10));
        assert_eq!(err.to_string(), "delivery timed out after 10s");
        assert_eq!(err.status(), None);
    }
}
