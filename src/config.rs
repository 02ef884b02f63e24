use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use crate::data::types::{parse_category_filter, Category};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub races: RacesConfig,
    pub clock: ClockConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub fetch_batch_size: u32,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RacesConfig {
    /// Seconds after the advertised start before a race is dropped
    pub expiration_threshold_secs: i64,
    pub refetch_interval_secs: u64,
    pub display_limit: usize,
    /// "all", a category name, or a category id
    pub category: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    pub tick_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub log_level: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.neds.com.au/rest/v1/racing/".to_string(),
            fetch_batch_size: 20,
            request_timeout_secs: 10,
        }
    }
}

impl Default for RacesConfig {
    fn default() -> Self {
        Self {
            expiration_threshold_secs: 60,
            refetch_interval_secs: 60,
            display_limit: 5,
            category: "all".to_string(),
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self { tick_interval_ms: 1000 }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self { log_level: "warn".to_string() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub racing_api_url: Option<String>,
    pub race_category: Option<String>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path))
    }

    /// Like `load`, but a missing file means defaults
    pub fn load_or_default(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the clock and refetch loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.races.refetch_interval_secs == 0 {
            anyhow::bail!("Invalid races.refetch_interval_secs: must be greater than 0");
        }
        if self.clock.tick_interval_ms == 0 {
            anyhow::bail!("Invalid clock.tick_interval_ms: must be greater than 0");
        }
        Ok(())
    }

    /// Environment values win over the file
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(url) = &env.racing_api_url {
            self.api.base_url = url.clone();
        }
        if let Some(category) = &env.race_category {
            self.races.category = category.clone();
        }
    }

    pub fn category_filter(&self) -> Result<Option<Category>> {
        parse_category_filter(&self.races.category)
            .with_context(|| format!("Invalid races.category: {}", self.races.category))
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl RacesConfig {
    pub fn refetch_interval(&self) -> Duration {
        Duration::from_secs(self.refetch_interval_secs)
    }
}

impl ClockConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl EnvConfig {
    pub fn load() -> Self {
        dotenv::dotenv().ok();

        Self {
            racing_api_url: std::env::var("RACING_API_URL").ok(),
            race_category: std::env::var("RACE_CATEGORY").ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.races.expiration_threshold_secs, 60);
        assert_eq!(config.races.refetch_interval(), Duration::from_secs(60));
        assert_eq!(config.races.display_limit, 5);
        assert_eq!(config.api.fetch_batch_size, 20);
        assert_eq!(config.clock.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.category_filter().unwrap(), None);
    }

    #[test]
    fn test_partial_overrides() {
        let config = Config::parse(
            r#"
            [races]
            expiration_threshold_secs = 90
            display_limit = 10
            category = "greyhound"

            [api]
            base_url = "http://localhost:8080/racing"
            "#,
        )
        .unwrap();

        assert_eq!(config.races.expiration_threshold_secs, 90);
        assert_eq!(config.races.display_limit, 10);
        assert_eq!(config.races.refetch_interval_secs, 60);
        assert_eq!(config.api.base_url, "http://localhost:8080/racing");
        assert_eq!(config.api.fetch_batch_size, 20);
        assert_eq!(config.category_filter().unwrap(), Some(Category::Greyhound));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::default();
        config.apply_env(&EnvConfig {
            racing_api_url: Some("http://proxy/api".to_string()),
            race_category: Some("horse".to_string()),
        });

        assert_eq!(config.api.base_url, "http://proxy/api");
        assert_eq!(config.category_filter().unwrap(), Some(Category::Horse));
    }

    #[test]
    fn test_invalid_category_is_an_error() {
        let mut config = Config::default();
        config.races.category = "camel".to_string();
        assert!(config.category_filter().is_err());
    }

    #[test]
    fn test_zero_refetch_interval_is_rejected() {
        let err = Config::parse("[races]\nrefetch_interval_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("races.refetch_interval_secs"));
    }

    #[test]
    fn test_zero_tick_interval_is_rejected() {
        let err = Config::parse("[clock]\ntick_interval_ms = 0\n").unwrap_err();
        assert!(err.to_string().contains("clock.tick_interval_ms"));
    }

    #[test]
    fn test_load_reports_invalid_interval() {
        let path = std::env::temp_dir().join(format!("next-to-jump-{}.toml", std::process::id()));
        fs::write(&path, "[races]\nrefetch_interval_secs = 0\n").unwrap();

        let err = Config::load(path.to_str().unwrap()).unwrap_err();
        assert!(format!("{:#}", err).contains("races.refetch_interval_secs"));
        assert!(Config::default().validate().is_ok());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load_or_default("does-not-exist.toml").unwrap();
        assert_eq!(config.races.display_limit, 5);
        assert!(Config::load("does-not-exist.toml").is_err());
    }
}
