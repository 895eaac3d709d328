/// Configuration management for Related Service
///
/// Loads configuration from environment variables.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Cache configuration
    pub cache: CacheConfig,
    /// Upstream collaborator services
    pub upstream: UpstreamConfig,
    /// Ranking behavior
    pub ranking: RankingConfig,
    /// Resource provider toggles
    pub providers: ProvidersConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// HTTP port
    pub http_port: u16,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Redis URL (redis://host:port)
    pub redis_url: String,
    /// TTL for cached recipient lists, in seconds
    #[serde(default = "default_recipient_ttl")]
    pub recipient_ttl_secs: u64,
    /// TTL for cached candidate lists, in seconds
    #[serde(default = "default_related_ttl")]
    pub related_ttl_secs: u64,
}

/// Upstream collaborator services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the identity/membership service
    pub identity_base_url: String,
    /// Base URL of the share-records service
    pub shares_base_url: String,
    /// Base URL prepended to result links; empty yields relative links
    #[serde(default)]
    pub frontend_base_url: String,
    /// Per-call timeout for upstream requests, in milliseconds
    #[serde(default = "default_upstream_timeout_ms")]
    pub timeout_ms: u64,
}

/// Ranking behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Result count when the caller does not pass a limit
    #[serde(default = "default_result_max")]
    pub result_max: usize,
}

/// Resource provider toggles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Deck board provider
    #[serde(default = "default_provider_enabled")]
    pub deck_enabled: bool,
    /// Calendar provider
    #[serde(default = "default_provider_enabled")]
    pub calendar_enabled: bool,
    /// Talk room provider
    #[serde(default = "default_provider_enabled")]
    pub talk_enabled: bool,
}

// Default values
fn default_recipient_ttl() -> u64 {
    600
}

fn default_related_ttl() -> u64 {
    600
}

fn default_upstream_timeout_ms() -> u64 {
    2000
}

fn default_result_max() -> usize {
    7
}

fn default_provider_enabled() -> bool {
    true
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8015), // related-service default HTTP port
        };

        let cache = CacheConfig {
            redis_url: std::env::var("REDIS_URL")
                .context("REDIS_URL environment variable not set")?,
            recipient_ttl_secs: std::env::var("CACHE_RECIPIENT_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_recipient_ttl),
            related_ttl_secs: std::env::var("CACHE_RELATED_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_related_ttl),
        };

        let upstream = UpstreamConfig {
            identity_base_url: std::env::var("IDENTITY_SERVICE_URL")
                .context("IDENTITY_SERVICE_URL environment variable not set")?,
            shares_base_url: std::env::var("SHARES_SERVICE_URL")
                .context("SHARES_SERVICE_URL environment variable not set")?,
            frontend_base_url: std::env::var("FRONTEND_BASE_URL").unwrap_or_default(),
            timeout_ms: std::env::var("UPSTREAM_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_upstream_timeout_ms),
        };

        let ranking = RankingConfig {
            result_max: std::env::var("RELATED_RESULT_MAX")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_result_max),
        };

        let providers = ProvidersConfig {
            deck_enabled: std::env::var("PROVIDER_DECK_ENABLED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_provider_enabled),
            calendar_enabled: std::env::var("PROVIDER_CALENDAR_ENABLED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_provider_enabled),
            talk_enabled: std::env::var("PROVIDER_TALK_ENABLED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_provider_enabled),
        };

        Ok(Config {
            app,
            cache,
            upstream,
            ranking,
            providers,
        })
    }
}
