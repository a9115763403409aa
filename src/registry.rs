use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;
use tracing::info;

use crate::adapters::{GlipAdapter, OutputAdapter, SlackAdapter};
use crate::normalizers::{Normalizer, Slack, TravisCi, Userlike};

/// Binds a source-type key to its normalizer and default output adapter.
#[derive(Clone)]
pub struct SourceTypeRegistration {
    /// Lowercase identifier, e.g. "travisci"
    pub key: String,
    pub normalizer: Arc<dyn Normalizer>,
    pub output_adapter_key: String,
}

impl std::fmt::Debug for SourceTypeRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceTypeRegistration")
            .field("key", &self.key)
            .field("normalizer", &self.normalizer.display_name())
            .field("output_adapter_key", &self.output_adapter_key)
            .finish()
    }
}

/// Source types and output adapters known to the service.
///
/// Filled in once at startup, then only read.
#[derive(Default)]
pub struct Registry {
    sources: HashMap<String, SourceTypeRegistration>,
    adapters: HashMap<String, Arc<dyn OutputAdapter>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in normalizer, routed to `default_output` unless a request
    /// says otherwise.
    pub fn builtin(client: Client, default_output: &str) -> Self {
        let mut registry = Self::new();

        registry.register_adapter(Arc::new(GlipAdapter::new(client.clone())));
        registry.register_adapter(Arc::new(SlackAdapter::new(client)));

        let sources: [(&str, Arc<dyn Normalizer>); 3] = [
            ("slack", Arc::new(Slack)),
            ("travisci", Arc::new(TravisCi)),
            ("userlike", Arc::new(Userlike)),
        ];
        for (key, normalizer) in sources {
            registry.register_source(key, normalizer, default_output);
        }

        registry
    }

    pub fn register_source(
        &mut self,
        key: &str,
        normalizer: Arc<dyn Normalizer>,
        output_adapter_key: &str,
    ) {
        let key = key.to_lowercase();
        info!(
            "Registered input type: {} ({}) -> {}",
            key,
            normalizer.display_name(),
            output_adapter_key
        );
        self.sources.insert(
            key.clone(),
            SourceTypeRegistration {
                key,
                normalizer,
                output_adapter_key: output_adapter_key.to_lowercase(),
            },
        );
    }

    pub fn register_adapter(&mut self, adapter: Arc<dyn OutputAdapter>) {
        info!("Registered output type: {}", adapter.key());
        self.adapters.insert(adapter.key().to_lowercase(), adapter);
    }

    /// Case-insensitive exact match on the source-type key.
    pub fn resolve_source_type(&self, identifier: &str) -> Option<&SourceTypeRegistration> {
        self.sources.get(&identifier.trim().to_lowercase())
    }

    pub fn adapter(&self, key: &str) -> Option<&Arc<dyn OutputAdapter>> {
        self.adapters.get(&key.trim().to_lowercase())
    }

    /// Sorted for stable display.
    pub fn source_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.sources.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn adapter_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registrations() {
        let registry = Registry::builtin(Client::new(), "glip");
        assert_eq!(registry.source_keys(), vec!["slack", "travisci", "userlike"]);
        assert_eq!(registry.adapter_keys(), vec!["glip", "slack"]);

        let travis = registry.resolve_source_type("travisci").unwrap();
        assert_eq!(travis.output_adapter_key, "glip");
        assert_eq!(travis.normalizer.display_name(), "Travis CI");

        let slack = registry.resolve_source_type("Slack").unwrap();
        assert_eq!(slack.normalizer.display_name(), "Slack");
        assert_eq!(slack.output_adapter_key, "glip");
    }

    #[test]
    fn test_resolution_is_case_insensitive() {
        let registry = Registry::builtin(Client::new(), "slack");
        for identifier in ["TravisCI", "travisci", "TRAVISCI"] {
            let registration = registry.resolve_source_type(identifier).unwrap();
            assert_eq!(registration.key, "travisci");
        }
    }

    #[test]
    fn test_no_fuzzy_matching() {
        let registry = Registry::builtin(Client::new(), "glip");
        assert!(registry.resolve_source_type("travis").is_none());
        assert!(registry.resolve_source_type("travisci2").is_none());
        assert!(registry.resolve_source_type("").is_none());
    }

    #[test]
    fn test_adapter_lookup_is_case_insensitive() {
        let registry = Registry::builtin(Client::new(), "glip");
        assert_eq!(registry.adapter("Slack").unwrap().key(), "slack");
        assert!(registry.adapter("teams").is_none());
    }
}
