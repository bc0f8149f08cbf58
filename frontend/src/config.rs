use gloo_storage::{LocalStorage, Storage};

use crate::cache::CacheConfig;

/// LocalStorage key that overrides the compiled-in service base URL.
pub const API_BASE_STORAGE_KEY: &str = "horsewatch.api_base";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Prefix for every `/api/...` path. Empty means same origin.
    pub api_base_url: String,
    pub stale_time_ms: f64,
    pub retry: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        let cache = CacheConfig::default();
        Self {
            api_base_url: normalize_base(option_env!("HORSEWATCH_API_BASE").unwrap_or_default()),
            stale_time_ms: cache.stale_time_ms,
            retry: cache.retry,
        }
    }
}

impl AppConfig {
    /// Defaults, with the base URL taken from LocalStorage when one is set.
    pub fn load() -> Self {
        let mut config = Self::default();
        match LocalStorage::get::<String>(API_BASE_STORAGE_KEY) {
            Ok(base) => {
                log::info!("Using API base from local storage: {}", base);
                config.api_base_url = normalize_base(&base);
            }
            Err(_) => log::debug!("No stored API base, using {:?}", config.api_base_url),
        }
        config
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            stale_time_ms: self.stale_time_ms,
            retry: self.retry,
        }
    }
}

fn normalize_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}
