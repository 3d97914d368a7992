use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
                                      Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub database_path: PathBuf,
    pub api_port: u16,
    pub seoul_open_api: SeoulOpenApiConfig,
    pub weather: WeatherConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/petple.db"),
            api_port: 8000,
            seoul_open_api: SeoulOpenApiConfig::default(),
            weather: WeatherConfig::default(),
        }
    }
}

/// Seoul open-data API used for the pet clinic feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SeoulOpenApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub dataset: String,
    /// Rows per request. The API caps a window at 1000 rows.
    pub page_size: u32,
    /// Upper bound on rows walked by one scheduled sync.
    pub max_rows: u32,
    pub timeout_secs: u64,
    pub sync_enabled: bool,
    pub sync_hour: u32,
    pub sync_minute: u32,
}

impl Default for SeoulOpenApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://openapi.seoul.go.kr:8088".to_string(),
            api_key: "sample".to_string(),
            dataset: "LOCALDATA_020301".to_string(),
            page_size: 1000,
            max_rows: 10_000,
            timeout_secs: 30,
            sync_enabled: true,
            sync_hour: 4,
            sync_minute: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub base_url: String,
    pub location: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub enabled: bool,
    pub crawl_hour: u32,
    pub crawl_minute: u32,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://search.naver.com".to_string(),
            location: "서울".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 10,
            enabled: true,
            crawl_hour: 18,
            crawl_minute: 23,
        }
    }
}
