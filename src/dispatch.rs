//! Transport-agnostic request handling.
//!
//! Every inbound webhook, whatever carried it, goes through
//! [`Dispatcher::dispatch`]: authorize, resolve the source type, normalize,
//! deliver. Each stage either hands over to the next or ends the request
//! with a [`DispatchOutcome`].

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::adapters::{DeliveryError, DeliveryReceipt};
use crate::auth::AccessControl;
use crate::config::Config;
use crate::registry::{Registry, SourceTypeRegistration};

/// Fields a transport pulls out of its native request.
#[derive(Debug, Clone, Default)]
pub struct DispatchRequest {
    pub input_type: Option<String>,
    pub output_type: Option<String>,
    pub token: Option<String>,
    /// Destination override
    pub url: Option<String>,
    pub body: Vec<u8>,
}

/// How a request ended. Transports map this to their own response shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Stopped before normalization. `code` is 400 or 401.
    Rejected { code: u16, reason: String },
    NormalizeFailed { reason: String },
    DeliveryFailed {
        #[serde(skip_serializing_if = "Option::is_none")]
        remote_status: Option<u16>,
        body: String,
    },
    Delivered { receipt: DeliveryReceipt },
}

impl DispatchOutcome {
    fn rejected(code: u16, reason: impl Into<String>) -> Self {
        DispatchOutcome::Rejected {
            code,
            reason: reason.into(),
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered { .. })
    }
}

/// Owns the registry, access table and default destinations. Built once and
/// shared read-only between concurrent requests.
pub struct Dispatcher {
    registry: Registry,
    access: AccessControl,
    destinations: HashMap<String, String>,
    delivery_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        registry: Registry,
        access: AccessControl,
        destinations: HashMap<String, String>,
        delivery_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            access,
            destinations,
            delivery_timeout,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("chathooks/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let registry = Registry::builtin(client, &config.delivery.default_output);
        if registry.adapter(&config.delivery.default_output).is_none() {
            anyhow::bail!(
                "Unknown delivery.default_output '{}' (known: {})",
                config.delivery.default_output,
                registry.adapter_keys().join(", ")
            );
        }
        for output in config.destinations.keys() {
            if registry.adapter(output).is_none() {
                warn!("Ignoring destination for unknown output type: {}", output);
            }
        }

        Ok(Self::new(
            registry,
            AccessControl::new(config.auth.tokens.iter().cloned()),
            config.destinations.clone(),
            Duration::from_secs(config.delivery.timeout_secs),
        ))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn authorize(&self, token: Option<&str>) -> bool {
        self.access.authorize(token)
    }

    pub fn resolve_source_type(&self, identifier: &str) -> Option<&SourceTypeRegistration> {
        self.registry.resolve_source_type(identifier)
    }

    pub async fn dispatch(&self, request: DispatchRequest) -> DispatchOutcome {
        let outcome = self.run(request).await;
        match &outcome {
            DispatchOutcome::Delivered { receipt } => {
                info!(remote_status = receipt.status, "Webhook delivered")
            }
            DispatchOutcome::Rejected { code, reason } => {
                warn!(code, reason = %reason, "Webhook rejected")
            }
            DispatchOutcome::NormalizeFailed { reason } => {
                warn!(reason = %reason, "Webhook payload not accepted")
            }
            DispatchOutcome::DeliveryFailed {
                remote_status,
                body,
            } => warn!(?remote_status, body = %body, "Webhook delivery failed"),
        }
        outcome
    }

    async fn run(&self, request: DispatchRequest) -> DispatchOutcome {
        if !self.authorize(request.token.as_deref()) {
            return DispatchOutcome::rejected(401, "access denied: missing or invalid token");
        }

        let identifier = non_blank(request.input_type.as_deref());
        let Some(identifier) = identifier else {
            return DispatchOutcome::rejected(400, "missing input type (inputType)");
        };
        let Some(registration) = self.resolve_source_type(identifier) else {
            return DispatchOutcome::rejected(400, format!("unknown input type: {}", identifier));
        };

        let output_key = non_blank(request.output_type.as_deref())
            .unwrap_or(registration.output_adapter_key.as_str())
            .to_lowercase();
        let Some(adapter) = self.registry.adapter(&output_key) else {
            return DispatchOutcome::rejected(400, format!("unknown output type: {}", output_key));
        };

        let destination = non_blank(request.url.as_deref())
            .or_else(|| self.destinations.get(&output_key).map(String::as_str));
        let Some(destination) = destination else {
            return DispatchOutcome::rejected(
                400,
                format!("no destination url for output type: {}", output_key),
            );
        };
        if let Err(e) = reqwest::Url::parse(destination) {
            return DispatchOutcome::rejected(400, format!("invalid destination url: {}", e));
        }

        info!(
            input_type = %registration.key,
            output_type = %output_key,
            bytes = request.body.len(),
            "Dispatching webhook"
        );

        let message = match registration.normalizer.normalize(&request.body) {
            Ok(message) => message,
            Err(e) => {
                return DispatchOutcome::NormalizeFailed {
                    reason: format!(
                        "{} payload not accepted: {}",
                        registration.normalizer.display_name(),
                        e
                    ),
                }
            }
        };

        let delivery = tokio::time::timeout(
            self.delivery_timeout,
            adapter.deliver(destination, &message),
        )
        .await
        .unwrap_or_else(|_| Err(DeliveryError::Timeout(self.delivery_timeout)));

        match delivery {
            Ok(receipt) => DispatchOutcome::Delivered { receipt },
            Err(e) => DispatchOutcome::DeliveryFailed {
                remote_status: e.status(),
                body: e.body(),
            },
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
