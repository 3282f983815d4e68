use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::api::{MAX_BATCH_SIZE, MIN_API_KEY_LEN};

/// Configuration for the traffic analyzer
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Metadata API settings
    pub api: ApiConfig,

    /// Table ingestion settings
    pub ingest: IngestConfig,

    /// Output and reporting settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API key for the YouTube Data API
    pub api_key: Option<String>,

    /// Timeout for metadata requests (seconds)
    pub timeout_seconds: u64,

    /// Attempts per batch before giving up on it
    pub max_attempts: u32,

    /// IDs per videos.list request (capped at the API's limit of 50)
    pub batch_size: usize,

    /// Pause between successive batches (milliseconds)
    pub batch_pause_ms: u64,

    /// Initial retry backoff; doubles per attempt (milliseconds)
    pub backoff_base_ms: u64,

    /// How long fetched responses stay valid in the cache (seconds)
    pub cache_ttl_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            timeout_seconds: 10,
            max_attempts: 3,
            batch_size: MAX_BATCH_SIZE,
            batch_pause_ms: 100,
            backoff_base_ms: 500,
            cache_ttl_seconds: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Row warnings surfaced per table before summarizing the rest
    pub max_row_warnings: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_row_warnings: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where to write the CSV export; stdout summary only when unset
    pub export_path: Option<PathBuf>,

    /// Log level filter
    pub log_level: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            export_path: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let config_paths = [
            "yt-traffic-analyzer.toml",
            "config/yt-traffic-analyzer.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(api_key) = std::env::var("YT_ANALYZER_API_KEY") {
            config.api.api_key = Some(api_key);
        }

        if let Ok(timeout) = std::env::var("YT_ANALYZER_TIMEOUT_SECONDS") {
            config.api.timeout_seconds = timeout.parse().unwrap_or(10);
        }

        if let Ok(ttl) = std::env::var("YT_ANALYZER_CACHE_TTL_SECONDS") {
            config.api.cache_ttl_seconds = ttl.parse().unwrap_or(3600);
        }

        if let Ok(export_path) = std::env::var("YT_ANALYZER_EXPORT_PATH") {
            config.output.export_path = Some(PathBuf::from(export_path));
        }

        if let Ok(log_level) = std::env::var("YT_ANALYZER_LOG_LEVEL") {
            config.output.log_level = log_level;
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api.batch_size == 0 || self.api.batch_size > MAX_BATCH_SIZE {
            return Err(anyhow!(
                "batch_size must be between 1 and {}",
                MAX_BATCH_SIZE
            ));
        }

        if self.api.max_attempts == 0 {
            return Err(anyhow!("max_attempts must be greater than 0"));
        }

        if self.api.timeout_seconds == 0 {
            return Err(anyhow!("timeout_seconds must be greater than 0"));
        }

        if let Some(ref api_key) = self.api.api_key {
            if api_key.trim().len() < MIN_API_KEY_LEN {
                return Err(anyhow!(
                    "API key must be at least {} characters",
                    MIN_API_KEY_LEN
                ));
            }
        }

        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Traffic Analyzer Configuration:\n\
            - Batch size: {}\n\
            - Max attempts: {}\n\
            - Request timeout: {}s\n\
            - Cache TTL: {}s\n\
            - API key: {}\n\
            - Export path: {}",
            self.api.batch_size,
            self.api.max_attempts,
            self.api.timeout_seconds,
            self.api.cache_ttl_seconds,
            if self.api.api_key.is_some() { "set" } else { "not set" },
            self.output
                .export_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "none".to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.batch_size, 50);
        assert_eq!(config.api.max_attempts, 3);
        assert_eq!(config.api.cache_ttl_seconds, 3600);
        assert_eq!(config.ingest.max_row_warnings, 5);
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());

        let mut oversized = Config::default();
        oversized.api.batch_size = 51;
        assert!(oversized.validate().is_err());

        let mut zero_batch = Config::default();
        zero_batch.api.batch_size = 0;
        assert!(zero_batch.validate().is_err());

        let mut short_key = Config::default();
        short_key.api.api_key = Some("too-short".to_string());
        assert!(short_key.validate().is_err());

        let mut good_key = Config::default();
        good_key.api.api_key = Some("AIzaSyA1234567890abcdefghij".to_string());
        assert!(good_key.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.api.batch_size, config.api.batch_size);
        assert_eq!(parsed.output.log_level, config.output.log_level);
    }

    #[test]
    fn test_save_writes_parseable_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.api.cache_ttl_seconds = 60;
        config.save(path.to_str().unwrap()).unwrap();

        let reloaded: Config =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(reloaded.api.cache_ttl_seconds, 60);
    }
}
