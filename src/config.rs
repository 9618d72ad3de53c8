use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub suggest: SuggestConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding the web UI assets (index.html, script.js, ...).
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            cache_capacity: default_cache_capacity(),
            cache_ttl_secs: default_cache_ttl_secs(),
            allowed_origins: Vec::new(),
        }
    }
}

/// Suggestion source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Upper bound for one fetch, retries included.
    #[serde(default = "default_fetch_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_ms: default_fetch_timeout_ms(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

impl SuggestConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Graph build defaults
#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_build_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_depth")]
    pub depth: u32,
    #[serde(default = "default_radius")]
    pub radius: u32,
    #[serde(default = "default_pattern")]
    pub pattern: String,
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_build_timeout_ms(),
            depth: default_depth(),
            radius: default_radius(),
            pattern: default_pattern(),
            format: default_format(),
        }
    }
}

/// Operator notification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Environment variable holding `chatId#token`.
    #[serde(default = "default_credentials_env")]
    pub credentials_env: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            credentials_env: default_credentials_env(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("webui")
}

fn default_cache_capacity() -> usize {
    1000
}

fn default_cache_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_endpoint() -> String {
    "http://suggestqueries.google.com/complete/search".to_string()
}

fn default_fetch_timeout_ms() -> u64 {
    5000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    200
}

fn default_build_timeout_ms() -> u64 {
    10_000
}

fn default_depth() -> u32 {
    1
}

fn default_radius() -> u32 {
    10
}

fn default_pattern() -> String {
    " vs ".to_string()
}

fn default_format() -> String {
    "json".to_string()
}

fn default_credentials_env() -> String {
    "TELEGRAM".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in EGOGRAPH_CONFIG environment variable (must exist)
    /// 2. ./config.toml in current directory (built-in defaults if absent)
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let (config_path, explicit) = match std::env::var("EGOGRAPH_CONFIG") {
            Ok(path) => (PathBuf::from(path), true),
            Err(_) => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !explicit && !config_path.exists() {
            log::info!("No {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
            let config = Config::default();
            config.validate()?;
            return Ok(config);
        }

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config = Self::from_toml(&config_str)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(config)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("Invalid TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.suggest.max_attempts == 0 {
            anyhow::bail!("suggest.max_attempts must be greater than 0");
        }

        if self.suggest.timeout_ms == 0 {
            anyhow::bail!("suggest.timeout_ms must be greater than 0");
        }

        if self.build.timeout_ms == 0 {
            anyhow::bail!("build.timeout_ms must be greater than 0");
        }

        if self.server.cache_ttl_secs == 0 {
            anyhow::bail!("server.cache_ttl_secs must be greater than 0");
        }

        if self.build.pattern.is_empty() {
            anyhow::bail!("build.pattern must not be empty");
        }

        url::Url::parse(&self.suggest.endpoint)
            .with_context(|| format!("suggest.endpoint is not a valid URL: {}", self.suggest.endpoint))?;

        Ok(())
    }

    pub fn build_timeout(&self) -> Duration {
        Duration::from_millis(self.build.timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.server.cache_ttl_secs)
    }
}
