//! Handles settings for the application. Configuration is written in
//! `settings.toml`.
//!
//! Everything the process needs, including the token-signing secret, is
//! carried in the [`Settings`] value built once at startup.
use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    /// Log level for the env filter (e.g. "info", "debug").
    pub level: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
    /// Process-wide secret used to sign and verify bearer tokens.
    pub signing_secret: String,
    pub token_ttl_hours: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings"))
            .build()?;

        settings.try_deserialize()
    }
}
