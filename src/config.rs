// src/config.rs - environment-driven resolver configuration
use log::{debug, info, warn};
use std::env;
use std::time::Duration;

pub const DEFAULT_OVERPASS_API_URL: &str = "https://overpass-api.de/api/interpreter";
pub const DEFAULT_NOMINATIM_API_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_OVERPASS_MIN_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_NAME_SEARCH_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub overpass_url: String,
    pub nominatim_url: String,
    /// Descriptive client identifier sent with every outbound request.
    /// Both upstream services ask clients to identify themselves.
    pub user_agent: String,
    pub http_timeout: Duration,
    /// Minimum spacing between calls to the bulk spatial-tag source.
    pub overpass_min_interval: Duration,
    /// Maximum results requested from the name search per call.
    pub name_search_limit: usize,
}

impl ResolverConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let overpass_url = env::var("OVERPASS_API_URL")
            .unwrap_or_else(|_| DEFAULT_OVERPASS_API_URL.to_string());
        let nominatim_url = env::var("NOMINATIM_API_URL")
            .unwrap_or_else(|_| DEFAULT_NOMINATIM_API_URL.to_string());
        let user_agent = env::var("RESOLVER_USER_AGENT").unwrap_or_default();

        let http_timeout_secs = env::var("RESOLVER_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        let overpass_min_interval_ms = env::var("OVERPASS_MIN_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_OVERPASS_MIN_INTERVAL_MS);
        let name_search_limit = env::var("NAME_SEARCH_LIMIT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_NAME_SEARCH_LIMIT);

        let config = Self {
            overpass_url,
            nominatim_url,
            user_agent,
            http_timeout: Duration::from_secs(http_timeout_secs),
            overpass_min_interval: Duration::from_millis(overpass_min_interval_ms),
            name_search_limit,
        };
        debug!("Resolver config: {:?}", config);
        config
    }

    /// Log the current configuration
    pub fn log_config(&self) {
        info!("🌍 Location resolver configuration:");
        info!("   Overpass endpoint: {}", self.overpass_url);
        info!("   Nominatim endpoint: {}", self.nominatim_url);
        info!("   HTTP timeout: {:?}", self.http_timeout);
        info!(
            "   Overpass rate floor: {:?}",
            self.overpass_min_interval
        );
        if self.user_agent.is_empty() {
            warn!(
                "⚠️ RESOLVER_USER_AGENT is not set. Requests still go out, but \
                 the upstream services expect a descriptive client identifier."
            );
        } else {
            info!("   User agent: {}", self.user_agent);
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            overpass_url: DEFAULT_OVERPASS_API_URL.to_string(),
            nominatim_url: DEFAULT_NOMINATIM_API_URL.to_string(),
            user_agent: String::new(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            overpass_min_interval: Duration::from_millis(DEFAULT_OVERPASS_MIN_INTERVAL_MS),
            name_search_limit: DEFAULT_NAME_SEARCH_LIMIT,
        }
    }
}
