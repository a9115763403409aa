//! Fakes for exercising the dispatcher without a network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::adapters::{DeliveryError, DeliveryReceipt, OutputAdapter};
use crate::auth::AccessControl;
use crate::dispatch::Dispatcher;
use crate::message::CanonicalMessage;
use crate::normalizers::{NormalizeError, Normalizer, Userlike};
use crate::registry::Registry;

pub const DESTINATION: &str = "https://chat.example.com/webhook/default";

/// Wraps a real normalizer and counts calls.
pub struct CountingNormalizer {
    inner: Arc<dyn Normalizer>,
    pub calls: AtomicUsize,
}

impl CountingNormalizer {
    pub fn new(inner: Arc<dyn Normalizer>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Normalizer for CountingNormalizer {
    fn display_name(&self) -> &str {
        self.inner.display_name()
    }

    fn normalize(&self, body: &[u8]) -> Result<CanonicalMessage, NormalizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.normalize(body)
    }
}

pub enum Behavior {
    Accept,
    Reject(u16),
    Hang,
}

/// Records every delivery instead of posting it.
pub struct RecordingAdapter {
    key: String,
    behavior: Behavior,
    pub delivered: Mutex<Vec<(String, CanonicalMessage)>>,
}

impl RecordingAdapter {
    pub fn new(key: &str, behavior: Behavior) -> Self {
        Self {
            key: key.to_string(),
            behavior,
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub fn deliveries(&self) -> Vec<(String, CanonicalMessage)> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl OutputAdapter for RecordingAdapter {
    fn key(&self) -> &str {
        &self.key
    }

    async fn deliver(
        &self,
        destination: &str,
        message: &CanonicalMessage,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        self.delivered
            .lock()
            .unwrap()
            .push((destination.to_string(), message.clone()));

        match self.behavior {
            Behavior::Accept => Ok(DeliveryReceipt {
                status: 200,
                body: "ok".to_string(),
            }),
            Behavior::Reject(status) => Err(DeliveryError::Rejected {
                status,
                body: "rejected".to_string(),
            }),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                unreachable!("delivery should have timed out")
            }
        }
    }
}

pub struct Fixture {
    pub dispatcher: Arc<Dispatcher>,
    pub normalizer: Arc<CountingNormalizer>,
    pub adapter: Arc<RecordingAdapter>,
}

/// A dispatcher with one source type (`userlike`) routed to a recording
/// `glip` adapter whose default destination is [`DESTINATION`].
pub fn fixture(tokens: &[&str], behavior: Behavior) -> Fixture {
    let normalizer = Arc::new(CountingNormalizer::new(Arc::new(Userlike)));
    let adapter = Arc::new(RecordingAdapter::new("glip", behavior));

    let mut registry = Registry::new();
    registry.register_adapter(adapter.clone());
    registry.register_source("userlike", normalizer.clone(), "glip");

    let destinations = [("glip".to_string(), DESTINATION.to_string())]
        .into_iter()
        .collect();

    let dispatcher = Dispatcher::new(
        registry,
        AccessControl::new(tokens.iter().copied()),
        destinations,
        Duration::from_millis(200),
    );

    Fixture {
        dispatcher: Arc::new(dispatcher),
        normalizer,
        adapter,
    }
}

pub const WIDGET_BODY: &str = r#"{"_type":"chat_widget","_event":"","name":"Support","custom_url":"https://x","widget_version":3}"#;
