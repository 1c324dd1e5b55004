use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::engine::EngineSettings;

/// Longest countdown `QUESTION_TIME_SECS` may ask for.
pub const MAX_QUESTION_TIME: u32 = 600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} should be set")]
    Missing(&'static str),
    #[error("{name} can't be parsed from '{value}'")]
    Invalid { name: &'static str, value: String },
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    pub url: Url,
    pub address: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub teloxide_token: String,
    pub log_level: LevelFilter,
    /// Results are only kept in memory without a database.
    pub database_url: Option<String>,
    /// Long polling is used unless both ngrok variables are set.
    pub webhook: Option<WebhookConfig>,
    pub question_bank_dir: PathBuf,
    pub default_language: String,
    pub engine: EngineSettings,
}

impl Config {
    /// Reads the process environment, including a `.env` file if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let teloxide_token = var("TELOXIDE_TOKEN").ok_or(ConfigError::Missing("TELOXIDE_TOKEN"))?;
        let log_level = parsed(&var, "LOG_LEVEL")?.unwrap_or(LevelFilter::INFO);

        let webhook = match (parsed::<Url>(&var, "NGROK_URL")?, parsed(&var, "NGROK_ADDR")?) {
            (Some(url), Some(address)) => Some(WebhookConfig { url, address }),
            _ => None,
        };

        let defaults = EngineSettings::default();
        let question_time = match parsed(&var, "QUESTION_TIME_SECS")? {
            Some(value) if !(1..=MAX_QUESTION_TIME).contains(&value) => {
                return Err(ConfigError::OutOfRange {
                    name: "QUESTION_TIME_SECS",
                    value,
                    min: 1,
                    max: MAX_QUESTION_TIME,
                })
            }
            value => value.unwrap_or(defaults.question_time),
        };
        let engine = EngineSettings {
            question_time,
            auto_advance: parsed(&var, "AUTO_ADVANCE_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.auto_advance),
            ..defaults
        };

        Ok(Self {
            teloxide_token,
            log_level,
            database_url: var("DATABASE_URL"),
            webhook,
            question_bank_dir: var("QUESTION_BANK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("questions")),
            default_language: var("DEFAULT_LANGUAGE").unwrap_or_else(|| "en".to_owned()),
            engine,
        })
    }
}

fn parsed<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    var(name)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { name, value })
        })
        .transpose()
}
