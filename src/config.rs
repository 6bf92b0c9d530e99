use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

#[derive(Deserialize)]
pub struct Config {
    pub listen: ListenConfig,
    pub target: TargetConfig,
}

/// Where the relay accepts inbound connections.
#[derive(Deserialize)]
pub struct ListenConfig {
    pub ip: String,
    pub port: u16,
}

/// Where every inbound connection is forwarded.
#[derive(Clone, Deserialize)]
pub struct TargetConfig {
    pub host: String,
    pub port: u16,
}

impl ListenConfig {
    /// The `ip:port` string to bind.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

impl TargetConfig {
    /// The `host:port` string to connect to.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub fn load_config() -> Result<Config> {
    let content = fs::read_to_string("config.toml").context("Failed to read config.toml file")?;
    toml::from_str(&content).context("Failed to parse config.toml as valid TOML")
}
