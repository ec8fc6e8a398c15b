use anyhow::Result;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BUDGET: f64 = 1828.40;
pub const DEFAULT_PAGE_SIZE: usize = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub sources: SourcesConfig,
    pub storage: StorageConfig,
    pub scan: ScanConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    pub scored_items: Option<String>,
    pub amazon_items: Option<String>,
    pub ebay_items: Option<String>,
    pub search_endpoint: String,
    pub fetch_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub database_path: String,
    pub export_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    pub page_size: usize,
    pub default_budget: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    pub log_level: String,
}

impl SourcesConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sources: SourcesConfig {
                scored_items: Some("Flipper_AI/scored_items.json".to_string()),
                amazon_items: Some("Flipper_AI/items_amazon.json".to_string()),
                ebay_items: Some("Flipper_AI/items_ebay.json".to_string()),
                search_endpoint: "http://127.0.0.1:5000/".to_string(),
                fetch_timeout_secs: 15,
            },
            storage: StorageConfig {
                database_path: "data/flipper.db".to_string(),
                export_dir: PathBuf::from("."),
            },
            scan: ScanConfig {
                page_size: DEFAULT_PAGE_SIZE,
                default_budget: DEFAULT_BUDGET,
            },
            monitoring: MonitoringConfig {
                log_level: "info".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let defaults = Config::default();

        Ok(Config {
            sources: SourcesConfig {
                scored_items: optional_source("FLIPPER_SCORED_ITEMS", defaults.sources.scored_items),
                amazon_items: optional_source("FLIPPER_AMAZON_ITEMS", defaults.sources.amazon_items),
                ebay_items: optional_source("FLIPPER_EBAY_ITEMS", defaults.sources.ebay_items),
                search_endpoint: env::var("FLIPPER_SEARCH_ENDPOINT")
                    .unwrap_or(defaults.sources.search_endpoint),
                fetch_timeout_secs: env::var("FLIPPER_FETCH_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse()
                    .unwrap_or(15),
            },
            storage: StorageConfig {
                database_path: env::var("FLIPPER_DB_PATH")
                    .unwrap_or(defaults.storage.database_path),
                export_dir: env::var("FLIPPER_EXPORT_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.export_dir),
            },
            scan: ScanConfig {
                page_size: env::var("FLIPPER_PAGE_SIZE")
                    .unwrap_or_else(|_| DEFAULT_PAGE_SIZE.to_string())
                    .parse()
                    .ok()
                    .filter(|size: &usize| *size > 0)
                    .unwrap_or(DEFAULT_PAGE_SIZE),
                default_budget: env::var("FLIPPER_DEFAULT_BUDGET")
                    .unwrap_or_else(|_| DEFAULT_BUDGET.to_string())
                    .parse()
                    .ok()
                    .filter(|budget: &f64| *budget > 0.0)
                    .unwrap_or(DEFAULT_BUDGET),
            },
            monitoring: MonitoringConfig {
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
        })
    }
}

// An empty value disables the source.
fn optional_source(key: &str, default: Option<String>) -> Option<String> {
    match env::var(key) {
        Ok(value) if value.trim().is_empty() => None,
        Ok(value) => Some(value),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scan.page_size, 30);
        assert!((config.scan.default_budget - 1828.40).abs() < f64::EPSILON);
        assert_eq!(config.sources.fetch_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_optional_source_falls_back_to_default() {
        let value = optional_source(
            "FLIPPER_TEST_UNSET_SOURCE_KEY",
            Some("fallback.json".to_string()),
        );
        assert_eq!(value.as_deref(), Some("fallback.json"));
    }
}
