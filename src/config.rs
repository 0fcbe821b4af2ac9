use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::models::BudgetDefaults;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub listings: ListingsSettings,
    #[serde(default)]
    pub analytics: AnalyticsSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingsSettings {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsSettings {
    /// Events are dropped when no endpoint is configured
    pub endpoint: Option<String>,
    #[serde(default = "default_analytics_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,
    pub redis_url: Option<String>,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            redis_url: None,
            key_prefix: default_key_prefix(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSettings {
    #[serde(default = "default_min_price")]
    pub default_min_price: f64,
    #[serde(default = "default_max_price")]
    pub default_max_price: f64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            default_min_price: default_min_price(),
            default_max_price: default_max_price(),
        }
    }
}

impl ScoringSettings {
    pub fn budget_defaults(&self) -> BudgetDefaults {
        BudgetDefaults {
            min_price: self.default_min_price,
            max_price: self.default_max_price,
        }
    }
}

fn default_timeout_secs() -> u64 { 30 }
fn default_analytics_timeout_secs() -> u64 { 5 }
fn default_key_prefix() -> String { "nest".to_string() }
fn default_min_price() -> f64 { 0.0 }
fn default_max_price() -> f64 { 10_000.0 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingSettings {
    /// Apply `LOG_LEVEL` / `LOG_FORMAT` style overrides on top of the file values
    pub fn with_overrides(mut self, level: Option<String>, format: Option<String>) -> Self {
        if let Some(level) = level.filter(|l| !l.trim().is_empty()) {
            self.level = level;
        }
        if let Some(format) = format.filter(|f| !f.trim().is_empty()) {
            self.format = format;
        }
        self
    }

    pub fn is_pretty(&self) -> bool {
        self.format.eq_ignore_ascii_case("pretty")
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with NEST)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., NEST__LISTINGS__BASE_URL -> listings.base_url
            .add_source(environment())
            .build()?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        settings.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("NEST")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_default_scoring() {
        let scoring = ScoringSettings::default();
        assert_eq!(scoring.budget_defaults(), BudgetDefaults::default());
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
    }

    #[test]
    fn test_logging_overrides() {
        let logging = LoggingSettings {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        };
        assert!(logging.is_pretty());

        let logging = logging.with_overrides(Some("warn".to_string()), None);
        assert_eq!(logging.level, "warn");
        assert!(logging.is_pretty());

        let logging = logging.with_overrides(None, Some("json".to_string()));
        assert!(!logging.is_pretty());

        let logging = logging.with_overrides(Some(" ".to_string()), None);
        assert_eq!(logging.level, "warn");
    }

    #[test]
    fn test_minimal_file_uses_defaults() {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(
                r#"
                [server]
                host = "127.0.0.1"
                port = 9000

                [listings]
                base_url = "http://localhost:5000/api"

                [storage]
                backend = "redis"
                redis_url = "redis://127.0.0.1:6379"
                "#,
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.listings.timeout_secs, 30);
        assert_eq!(settings.storage.backend, StorageBackend::Redis);
        assert_eq!(settings.storage.key_prefix, "nest");
        assert!(settings.analytics.endpoint.is_none());
        assert_eq!(settings.scoring.default_max_price, 10_000.0);
    }
}
