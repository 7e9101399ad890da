/*!
 * Application configuration.
 *
 * Loading, validating and saving of the pipeline settings. Credentials are
 * plain fields here; only the binary copies them in from the environment
 * through `Config::apply_env_overrides`.
 */

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::errors::PipelineError;
use crate::markup::KeywordLink;

/// File name used when no config path is given
pub const DEFAULT_CONFIG_FILE: &str = "polypress.json";

/// Environment variable holding the content store URL
pub const ENV_STORE_BASE_URL: &str = "STRAPI_BASE_URL";

/// Environment variable holding the content store API token
pub const ENV_STORE_API_TOKEN: &str = "STRAPI_API_TOKEN";

/// Environment variable holding the translation engine key
pub const ENV_ENGINE_AUTH_KEY: &str = "DEEPL_AUTH_KEY";

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Locale all translations start from; never a target
    #[serde(default = "default_canonical_locale")]
    pub canonical_locale: String,

    /// Content store connection
    #[serde(default)]
    pub content_store: ContentStoreConfig,

    /// Translation engine connection
    #[serde(default)]
    pub engine: EngineConfig,

    /// Chunking, concurrency and caching
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Optional link rewriting after translation
    #[serde(default)]
    pub post_processing: PostProcessingConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Content store connection settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ContentStoreConfig {
    /// Instance base URL, e.g. "https://cms.example.com"
    #[serde(default = "String::new")]
    pub base_url: String,

    /// API token with read and write access
    #[serde(default = "String::new")]
    pub api_token: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ContentStoreConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_token: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Translation engine settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EngineConfig {
    /// DeepL authentication key
    #[serde(default = "String::new")]
    pub auth_key: String,

    /// API base URL; empty picks the free or pro API from the key
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_engine_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff base for retries in milliseconds, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Requests per minute; None or 0 disables client-side pacing
    #[serde(default)]
    pub rate_limit: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auth_key: String::new(),
            endpoint: String::new(),
            timeout_secs: default_engine_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            rate_limit: None,
        }
    }
}

/// Pipeline tuning
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Character budget per engine request
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Chunk requests in flight per document
    #[serde(default = "default_concurrent_chunk_requests")]
    pub concurrent_chunk_requests: usize,

    /// Locale jobs in flight per entry
    #[serde(default = "default_concurrent_locales")]
    pub concurrent_locales: usize,

    /// Reuse translated chunks within the process
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: default_max_chunk_chars(),
            concurrent_chunk_requests: default_concurrent_chunk_requests(),
            concurrent_locales: default_concurrent_locales(),
            cache_enabled: true,
        }
    }
}

/// Link post-processing, all disabled by default
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct PostProcessingConfig {
    /// Unwrap links pointing outside `site_host`
    #[serde(default)]
    pub strip_external_links: bool,

    /// Host considered internal, e.g. "example.com"
    #[serde(default)]
    pub site_host: Option<String>,

    /// Keywords to turn into links on first mention
    #[serde(default)]
    pub keyword_links: Vec<KeywordLink>,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_canonical_locale() -> String {
    "en".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_engine_timeout_secs() -> u64 {
    60
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_max_chunk_chars() -> usize {
    crate::markup::DEFAULT_MAX_CHUNK_CHARS
}

fn default_concurrent_chunk_requests() -> usize {
    3
}

fn default_concurrent_locales() -> usize {
    4
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Validate the configuration for consistency and required values
    ///
    /// Runs before any adapter is built, so a missing credential never
    /// reaches the network.
    pub fn validate(&self) -> Result<(), PipelineError> {
        crate::language_utils::validate_locale(&self.canonical_locale)
            .map_err(|e| PipelineError::Configuration(e.to_string()))?;

        if self.content_store.base_url.trim().is_empty() {
            return Err(PipelineError::Configuration(format!(
                "Content store base URL is required (set content_store.base_url or {})",
                ENV_STORE_BASE_URL
            )));
        }
        if self.content_store.api_token.trim().is_empty() {
            return Err(PipelineError::Configuration(format!(
                "Content store API token is required (set content_store.api_token or {})",
                ENV_STORE_API_TOKEN
            )));
        }
        if self.engine.auth_key.trim().is_empty() {
            return Err(PipelineError::Configuration(format!(
                "Translation engine key is required (set engine.auth_key or {})",
                ENV_ENGINE_AUTH_KEY
            )));
        }

        self.validate_pipeline()
    }

    /// Validate only the settings the pipeline itself uses
    pub fn validate_pipeline(&self) -> Result<(), PipelineError> {
        if self.pipeline.max_chunk_chars == 0 {
            return Err(PipelineError::Configuration("pipeline.max_chunk_chars must be at least 1".to_string()));
        }
        if self.pipeline.concurrent_chunk_requests == 0 {
            return Err(PipelineError::Configuration(
                "pipeline.concurrent_chunk_requests must be at least 1".to_string(),
            ));
        }
        if self.pipeline.concurrent_locales == 0 {
            return Err(PipelineError::Configuration("pipeline.concurrent_locales must be at least 1".to_string()));
        }
        if self.post_processing.strip_external_links && self.post_processing.site_host.is_none() {
            return Err(PipelineError::Configuration(
                "post_processing.site_host is required when strip_external_links is on".to_string(),
            ));
        }
        Ok(())
    }

    /// Copy credentials from the environment over the file values
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Copy credentials from `lookup` over the file values; empty values are ignored
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_STORE_BASE_URL) {
            self.content_store.base_url = url;
        }
        if let Some(token) = get(ENV_STORE_API_TOKEN) {
            self.content_store.api_token = token;
        }
        if let Some(key) = get(ENV_ENGINE_AUTH_KEY) {
            self.engine.auth_key = key;
        }
    }

    /// Default config location: `polypress.json` in the working directory if
    /// present, else `<config dir>/polypress/config.json`
    pub fn default_path() -> PathBuf {
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return local;
        }
        dirs::config_dir()
            .map(|dir| dir.join("polypress").join("config.json"))
            .unwrap_or(local)
    }

    /// Load the config at `path`, creating and saving a default one if missing
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Load the config at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save the config to `path` as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            canonical_locale: default_canonical_locale(),
            content_store: ContentStoreConfig::default(),
            engine: EngineConfig::default(),
            pipeline: PipelineConfig::default(),
            post_processing: PostProcessingConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
