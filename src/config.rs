use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_server_config")]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default = "default_delivery_config")]
    pub delivery: DeliveryConfig,
    /// Output type -> default webhook URL, used when a request has no `url`
    #[serde(default)]
    pub destinations: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    /// Accepted request tokens. Leaving this empty turns access control off.
    #[serde(default)]
    pub tokens: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeliveryConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Output type used when neither the request nor the registration picks one
    #[serde(default = "default_output")]
    pub default_output: String,
}

fn default_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_output() -> String {
    "glip".to_string()
}

fn default_server_config() -> ServerConfig {
    ServerConfig {
        address: default_address(),
        port: default_port(),
    }
}

fn default_delivery_config() -> DeliveryConfig {
    DeliveryConfig {
        timeout_secs: default_timeout_secs(),
        default_output: default_output(),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: default_server_config(),
            auth: AuthConfig::default(),
            delivery: default_delivery_config(),
            destinations: HashMap::new(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if let Ok(tokens) = std::env::var("CHATHOOKS_TOKENS") {
            config.merge_tokens(&tokens);
        }
        if let Ok(port) = std::env::var("PORT") {
            config.server.port = port
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {}", port))?;
        }

        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;

        config.delivery.default_output = config.delivery.default_output.to_lowercase();
        config.destinations = config
            .destinations
            .into_iter()
            .map(|(output, url)| (output.to_lowercase(), url))
            .collect();

        if config.delivery.timeout_secs == 0 {
            anyhow::bail!("delivery.timeout_secs must be greater than zero");
        }

        Ok(config)
    }

    /// Append comma-separated tokens, e.g. from `CHATHOOKS_TOKENS`.
    pub fn merge_tokens(&mut self, raw: &str) {
        self.auth.tokens.extend(
            raw.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        );
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.address, self.server.port)
    }
}
