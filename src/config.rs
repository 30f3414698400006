use config::{Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::OwnerId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
}

/// Upstream temp-mail API settings. The key/host pair goes out as static
/// credential headers on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub api_host: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub poll_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub log: LogConfig,
    pub provider: ProviderConfig,
    pub telegram: TelegramConfig,
    /// Owners allowed to use the privileged commands.
    pub admin_ids: Vec<OwnerId>,
}

impl Settings {
    pub fn new(config_path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut config_builder = config::Config::builder()
            // Log defaults
            .set_default("log.level", "info")?
            // Provider defaults
            .set_default(
                "provider.base_url",
                "https://privatix-temp-mail-v1.p.rapidapi.com",
            )?
            .set_default("provider.api_host", "privatix-temp-mail-v1.p.rapidapi.com")?
            .set_default("provider.api_key", "")?
            .set_default("provider.timeout_secs", 30)?
            // Telegram defaults
            .set_default("telegram.bot_token", "")?
            .set_default("telegram.poll_timeout_secs", 25)?
            .set_default("admin_ids", Vec::<i64>::new())?;

        // Add configuration from file
        if let Some(path) = config_path {
            config_builder = config_builder.add_source(File::with_name(path));
        }

        // Add environment variables with prefix
        // e.g. `TEMPMAIL_PROVIDER__API_KEY=...` overrides `provider.api_key`
        config_builder = config_builder.add_source(
            Environment::with_prefix("TEMPMAIL")
                .prefix_separator("_")
                .separator("__")
                .ignore_empty(true),
        );

        config_builder.build()?.try_deserialize()
    }

    pub fn is_admin(&self, owner: OwnerId) -> bool {
        self.admin_ids.contains(&owner)
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "info".to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log: LogConfig::default(),
            provider: ProviderConfig {
                base_url: "https://privatix-temp-mail-v1.p.rapidapi.com".to_string(),
                api_host: "privatix-temp-mail-v1.p.rapidapi.com".to_string(),
                api_key: String::new(),
                timeout_secs: 30,
            },
            telegram: TelegramConfig {
                bot_token: String::new(),
                poll_timeout_secs: 25,
            },
            admin_ids: Vec::new(),
        }
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load or parse configuration: {0}")]
    LoadError(#[from] config::ConfigError),
}
