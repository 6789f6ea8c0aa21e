mod defaults;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::HearsayError;
use defaults::*;

/// Top-level hearsay configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// IRC identity and connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_nick")]
    pub nick: String,
    #[serde(default = "default_nick")]
    pub user: String,
    #[serde(default = "default_nick")]
    pub realname: String,
    #[serde(default = "default_server")]
    pub server: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub tls: bool,
    /// Channel joined on connect.
    #[serde(default = "default_channel")]
    pub channel: String,
    /// Command prefix (e.g. `+` in `+help`).
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// User mode set on the bot's own nick after connecting.
    #[serde(default = "default_mode")]
    pub mode: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            nick: default_nick(),
            user: default_nick(),
            realname: default_nick(),
            server: default_server(),
            port: default_port(),
            tls: true,
            channel: default_channel(),
            prefix: default_prefix(),
            mode: default_mode(),
        }
    }
}

/// Storage and capture quotas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    /// Number of buffered chat messages that triggers a flush.
    #[serde(default = "default_message_pool_size")]
    pub message_pool_size: usize,
    /// Messages a handle needs before it counts toward the model.
    #[serde(default = "default_message_quota")]
    pub message_quota: i64,
    /// Handles meeting the message quota required for attribution and retraining.
    #[serde(default = "default_people_quota")]
    pub people_quota: i64,
    #[serde(default = "default_max_profiles")]
    pub max_profiles: i64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            message_pool_size: default_message_pool_size(),
            message_quota: default_message_quota(),
            people_quota: default_people_quota(),
            max_profiles: default_max_profiles(),
        }
    }
}

/// Deletion scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Retention window between `forget` and the actual purge.
    #[serde(default = "default_deletion_days")]
    pub deletion_days: u32,
    /// How long in-flight tasks get to finish on shutdown.
    #[serde(default = "default_grace_period_secs")]
    pub grace_period_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            deletion_days: default_deletion_days(),
            grace_period_secs: default_grace_period_secs(),
        }
    }
}

/// Remote inference service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    #[serde(default = "default_inference_url")]
    pub base_url: String,
    #[serde(default = "default_inference_timeout")]
    pub timeout_secs: u64,
    /// Whether users may request BERT embeddings when retraining.
    #[serde(default = "default_true")]
    pub bert: bool,
    #[serde(default = "default_true")]
    pub gpu: bool,
    #[serde(default = "default_retrain_cooldown_mins")]
    pub retrain_cooldown_mins: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: default_inference_url(),
            timeout_secs: default_inference_timeout(),
            bert: true,
            gpu: true,
            retrain_cooldown_mins: default_retrain_cooldown_mins(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Directory for a daily-rolling `hearsay.log`. Unset = stderr only.
    #[serde(default)]
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

impl Config {
    /// Replace zero and empty overrides with their defaults.
    ///
    /// A value only overrides its default when it is positive or non-empty.
    pub fn normalize(mut self) -> Self {
        fn keep_string(value: &mut String, fallback: fn() -> String) {
            if value.trim().is_empty() {
                *value = fallback();
            }
        }

        keep_string(&mut self.bot.nick, default_nick);
        keep_string(&mut self.bot.user, default_nick);
        keep_string(&mut self.bot.realname, default_nick);
        keep_string(&mut self.bot.server, default_server);
        keep_string(&mut self.bot.channel, default_channel);
        keep_string(&mut self.bot.prefix, default_prefix);
        keep_string(&mut self.bot.mode, default_mode);
        keep_string(&mut self.storage.db_path, default_db_path);
        keep_string(&mut self.inference.base_url, default_inference_url);
        keep_string(&mut self.logging.level, default_log_level);

        if self.bot.port == 0 {
            self.bot.port = default_port();
        }
        if self.storage.message_pool_size == 0 {
            self.storage.message_pool_size = default_message_pool_size();
        }
        if self.storage.message_quota <= 0 {
            self.storage.message_quota = default_message_quota();
        }
        if self.storage.people_quota <= 0 {
            self.storage.people_quota = default_people_quota();
        }
        if self.storage.max_profiles <= 0 {
            self.storage.max_profiles = default_max_profiles();
        }
        if self.scheduler.deletion_days == 0 {
            self.scheduler.deletion_days = default_deletion_days();
        }
        if self.inference.timeout_secs == 0 {
            self.inference.timeout_secs = default_inference_timeout();
        }
        self.inference.base_url = self.inference.base_url.trim_end_matches('/').to_string();
        self
    }
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, HearsayError> {
    let path = Path::new(path);
    if !path.exists() {
        info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| HearsayError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    parse(&content)
}

/// Parse configuration from TOML text.
pub fn parse(content: &str) -> Result<Config, HearsayError> {
    let config: Config = toml::from_str(content)
        .map_err(|e| HearsayError::Config(format!("failed to parse config: {}", e)))?;

    Ok(config.normalize())
}
