use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub operator: OperatorConfig,
    pub bridge: BridgeConfig,
    pub queue: QueueConfig,
    pub market_data: MarketDataConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Operator Basic-Auth pair. Empty values reject every submission.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct OperatorConfig {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// HMAC key for EA signatures. Never sent over the wire.
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct QueueConfig {
    /// redb file path, or `:memory:`. Unset disables the queue.
    pub path: Option<String>,
    pub key: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            path: None,
            key: "ea_trade_queue".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MarketDataConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub requests_per_minute: u32,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.twelvedata.com".to_string(),
            api_key: None,
            // Free-tier allowance.
            requests_per_minute: 8,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            // 1. Project config from config/bridge.{toml,json,ini}
            .add_source(File::with_name("config/bridge").required(false))
            // 2. Local overrides, not checked in
            .add_source(File::with_name("config/local").required(false))
            // 3. Environment, e.g. BRIDGE_OPERATOR__PASSWORD
            .add_source(
                Environment::with_prefix("BRIDGE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            // 4. Bare PORT as set by most hosting platforms
            .set_override_option("server.port", env::var("PORT").ok())?;

        Self::from_builder(builder)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }
}
