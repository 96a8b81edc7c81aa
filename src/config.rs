use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::error::{KassaflowError, Result};

/// Look up `KASSAFLOW_{key}` first, falling back to `{key}` for
/// compatibility with standard environment variable naming.
fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("KASSAFLOW_{}", key))
        .or_else(|_| std::env::var(key))
        .ok()
}

/// Main configuration for a Kassaflow deployment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub gateways: GatewaysConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

/// Per-gateway settings supplied by the operator.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewaysConfig {
    pub megakassa: GatewayConfig,
    pub topkassa: GatewayConfig,
}

/// Credentials and verification budget for one gateway integration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// Merchant identifier assigned by the gateway.
    #[serde(default)]
    pub merchant_id: i64,
    /// Shared signing secret.
    #[serde(default)]
    pub secret: String,
    /// Verification attempts allowed per rolling 24-hour window. Every
    /// inbound notification consumes one unit, valid or not.
    #[serde(default = "default_attempts_per_day")]
    pub attempts_per_day: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            gateways: GatewaysConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for GatewaysConfig {
    fn default() -> Self {
        Self {
            megakassa: GatewayConfig::default(),
            topkassa: GatewayConfig::default(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            merchant_id: 0,
            secret: String::new(),
            attempts_per_day: default_attempts_per_day(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_attempts_per_day() -> u32 {
    1000
}

impl ServerConfig {
    pub fn addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

impl GatewayConfig {
    /// Load one gateway section from `{PREFIX}_MERCHANT_ID`, `{PREFIX}_SECRET`
    /// and `{PREFIX}_ATTEMPTS_PER_DAY`.
    fn from_env(prefix: &str) -> Self {
        let mut config = Self::default();

        if let Some(merchant_id) = get_env_with_prefix(&format!("{}_MERCHANT_ID", prefix)) {
            if let Ok(id) = merchant_id.parse() {
                config.merchant_id = id;
            }
        }
        if let Some(secret) = get_env_with_prefix(&format!("{}_SECRET", prefix)) {
            config.secret = secret;
        }
        if let Some(attempts) = get_env_with_prefix(&format!("{}_ATTEMPTS_PER_DAY", prefix)) {
            if let Ok(val) = attempts.parse() {
                config.attempts_per_day = val;
            }
        }

        config
    }
}

/// Builder for Config with environment variable support
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_megakassa(mut self, gateway: GatewayConfig) -> Self {
        self.config.gateways.megakassa = gateway;
        self
    }

    pub fn with_topkassa(mut self, gateway: GatewayConfig) -> Self {
        self.config.gateways.topkassa = gateway;
        self
    }

    /// Load configuration from environment variables with KASSAFLOW_ prefix.
    pub fn from_env(mut self) -> Self {
        if let Some(host) = get_env_with_prefix("HOST") {
            self.config.server.host = host;
        }
        if let Some(port) = get_env_with_prefix("PORT") {
            if let Ok(p) = port.parse() {
                self.config.server.port = p;
            }
        }
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = get_env_with_prefix("LOG_JSON") {
            self.config.logging.json = json.parse().unwrap_or(false);
        }

        self.config.gateways.megakassa = GatewayConfig::from_env("MEGAKASSA");
        self.config.gateways.topkassa = GatewayConfig::from_env("TOPKASSA");

        self
    }

    /// Build the configuration, validating all settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the server address is invalid, the log level is
    /// unknown, a gateway secret is empty, or an attempts budget is zero.
    pub fn build(self) -> Result<Config> {
        self.config.server.addr().map_err(|e| {
            KassaflowError::validation_field(
                "server",
                format!(
                    "Invalid server address {}:{} - {}",
                    self.config.server.host, self.config.server.port, e
                ),
            )
        })?;

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            return Err(KassaflowError::validation_field(
                "logging.level",
                format!(
                    "Invalid log level: {}. Must be one of: {}",
                    self.config.logging.level,
                    valid_log_levels.join(", ")
                ),
            ));
        }

        for (name, gateway) in [
            ("megakassa", &self.config.gateways.megakassa),
            ("topkassa", &self.config.gateways.topkassa),
        ] {
            if gateway.secret.is_empty() {
                return Err(KassaflowError::validation_field(
                    format!("gateways.{}.secret", name),
                    "Signing secret must not be empty",
                ));
            }
            if gateway.attempts_per_day == 0 {
                return Err(KassaflowError::validation_field(
                    format!("gateways.{}.attempts_per_day", name),
                    "Attempts budget must be greater than 0",
                ));
            }
        }

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
