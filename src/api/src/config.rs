//! Configuration for keiba-refund.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::scraper::BASE_URL;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Scraping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Venue codes scraped for a date (42 浦和, 43 船橋, 44 大井, 45 川崎)
    #[serde(default = "default_venue_codes")]
    pub venue_codes: Vec<String>,
    #[serde(default = "default_races_per_venue")]
    pub races_per_venue: u8,
    /// Minimum seconds between requests
    #[serde(default = "default_request_interval_secs")]
    pub request_interval_secs: f64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    BASE_URL.to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_venue_codes() -> Vec<String> {
    ["42", "43", "44", "45"].iter().map(|s| s.to_string()).collect()
}

fn default_races_per_venue() -> u8 {
    12
}

fn default_request_interval_secs() -> f64 {
    1.0
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            venue_codes: default_venue_codes(),
            races_per_venue: default_races_per_venue(),
            request_interval_secs: default_request_interval_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ScrapeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Output locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_result_dir")]
    pub result_dir: String,
    #[serde(default = "default_prediction_dir")]
    pub prediction_dir: String,
}

fn default_result_dir() -> String {
    "results".to_string()
}

fn default_prediction_dir() -> String {
    "predictions".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            result_dir: default_result_dir(),
            prediction_dir: default_prediction_dir(),
        }
    }
}

/// One prediction source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// Report label, also used in the report file name
    pub label: String,
    /// Workbook file name prefix
    pub file_prefix: String,
}

impl PredictorConfig {
    pub fn new(label: &str, file_prefix: &str) -> Self {
        Self {
            label: label.to_string(),
            file_prefix: file_prefix.to_string(),
        }
    }
}

fn default_predictors() -> Vec<PredictorConfig> {
    vec![
        PredictorConfig::new("競馬大学", "競馬大学"),
        PredictorConfig::new("IQ150", "IQ150"),
        PredictorConfig::new("尻子", "尻子"),
    ]
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scrape: ScrapeConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default = "default_predictors")]
    pub predictors: Vec<PredictorConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            scrape: ScrapeConfig::default(),
            output: OutputConfig::default(),
            predictors: default_predictors(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and config file
    pub fn load() -> anyhow::Result<Self> {
        Self::load_with_env(None)
    }

    /// Load with explicit environment variables (`None` reads the process environment)
    fn load_with_env(vars: Option<config::Map<String, String>>) -> anyhow::Result<Self> {
        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Add config file if exists
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables (KEIBA_SCRAPE__TIMEOUT_SECS, etc.).
            // Values stay strings so venue codes like "05" keep their padding;
            // numeric fields are converted on deserialize.
            .add_source(
                config::Environment::with_prefix("KEIBA")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("scrape.venue_codes")
                    .source(vars),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.scrape.base_url, "https://nar.netkeiba.com");
        assert_eq!(config.scrape.venue_codes, vec!["42", "43", "44", "45"]);
        assert_eq!(config.scrape.races_per_venue, 12);
        assert_eq!(config.scrape.timeout(), Duration::from_secs(30));
        assert_eq!(config.output.result_dir, "results");
        assert_eq!(config.predictors.len(), 3);
        assert_eq!(config.predictors[1], PredictorConfig::new("IQ150", "IQ150"));
    }

    fn env(vars: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    #[test]
    fn test_env_single_venue_code() {
        let config = AppConfig::load_with_env(env(&[("KEIBA_SCRAPE__VENUE_CODES", "44")])).unwrap();
        assert_eq!(config.scrape.venue_codes, vec!["44"]);
    }

    #[test]
    fn test_env_venue_codes_keep_padding() {
        let config = AppConfig::load_with_env(env(&[("KEIBA_SCRAPE__VENUE_CODES", "05,44")])).unwrap();
        assert_eq!(config.scrape.venue_codes, vec!["05", "44"]);

        let config = AppConfig::load_with_env(env(&[("KEIBA_SCRAPE__VENUE_CODES", "05")])).unwrap();
        assert_eq!(config.scrape.venue_codes, vec!["05"]);
    }

    #[test]
    fn test_env_numeric_overrides() {
        let config = AppConfig::load_with_env(env(&[
            ("KEIBA_SERVER__PORT", "9000"),
            ("KEIBA_SCRAPE__REQUEST_INTERVAL_SECS", "2.5"),
            ("KEIBA_SCRAPE__RACES_PER_VENUE", "10"),
        ]))
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.scrape.request_interval_secs, 2.5);
        assert_eq!(config.scrape.races_per_venue, 10);
        assert_eq!(config.scrape.venue_codes, vec!["42", "43", "44", "45"]);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{"scrape": {"venue_codes": ["44"]}, "predictors": [{"label": "A", "file_prefix": "a"}]}"#,
        )
        .unwrap();

        assert_eq!(config.scrape.venue_codes, vec!["44"]);
        assert_eq!(config.scrape.races_per_venue, 12);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.predictors, vec![PredictorConfig::new("A", "a")]);
    }
}
