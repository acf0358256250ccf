//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Row-store configuration.
    pub store: StoreConfig,
    /// Batch job configuration.
    #[serde(default)]
    pub jobs: JobsConfig,
    /// Holiday source configuration.
    #[serde(default)]
    pub holidays: HolidayConfig,
}

/// Remote row-store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the row-store endpoint.
    pub url: String,
    /// API key sent with every request, if the store requires one.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Maximum retry attempts per call.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

/// Batch job configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    /// Fixed page size for batch scans.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_size() -> u32 {
    200
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

/// Where the per-year holiday set comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HolidaySource {
    /// The `national_holidays` table in the row-store.
    Table,
    /// An external per-year holiday API.
    Api,
}

/// Holiday source configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HolidayConfig {
    /// Which provider supplies the holiday set.
    #[serde(default = "default_holiday_source")]
    pub source: HolidaySource,
    /// Endpoint of the external holiday API, when `source` is `api`.
    #[serde(default)]
    pub api_url: Option<String>,
}

fn default_holiday_source() -> HolidaySource {
    HolidaySource::Table
}

impl Default for HolidayConfig {
    fn default() -> Self {
        Self {
            source: default_holiday_source(),
            api_url: None,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("FURLOUGH").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
