/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use polypress::app_config::{Config, LogLevel, ENV_ENGINE_AUTH_KEY, ENV_STORE_API_TOKEN, ENV_STORE_BASE_URL};
use polypress::errors::PipelineError;
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.canonical_locale, "en");
    assert_eq!(config.pipeline.max_chunk_chars, 30_000);
    assert_eq!(config.pipeline.concurrent_chunk_requests, 3);
    assert_eq!(config.pipeline.concurrent_locales, 4);
    assert!(config.pipeline.cache_enabled);
    assert_eq!(config.engine.retry_count, 3);
    assert_eq!(config.engine.retry_backoff_ms, 1000);
    assert_eq!(config.engine.rate_limit, None);
    assert!(!config.post_processing.strip_external_links);
    assert!(config.post_processing.keyword_links.is_empty());
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Each missing credential is reported as a configuration error
#[test]
fn test_validate_withMissingCredentials_shouldReturnConfigurationError() {
    let mut config = common::complete_config();
    assert!(config.validate().is_ok());

    config.engine.auth_key.clear();
    let err = config.validate().unwrap_err();
    assert!(matches!(err, PipelineError::Configuration(_)));
    assert!(err.to_string().contains(ENV_ENGINE_AUTH_KEY));
    assert!(err.is_fatal());

    let mut config = common::complete_config();
    config.content_store.api_token = "   ".to_string();
    assert!(config.validate().unwrap_err().to_string().contains(ENV_STORE_API_TOKEN));

    let mut config = common::complete_config();
    config.content_store.base_url.clear();
    assert!(config.validate().unwrap_err().to_string().contains(ENV_STORE_BASE_URL));
}

#[test]
fn test_validate_withInvalidPipelineSettings_shouldFail() {
    let mut config = common::complete_config();
    config.pipeline.max_chunk_chars = 0;
    assert!(config.validate().is_err());

    let mut config = common::complete_config();
    config.pipeline.concurrent_locales = 0;
    assert!(config.validate().is_err());

    let mut config = common::complete_config();
    config.canonical_locale = "xx".to_string();
    assert!(config.validate().is_err());

    let mut config = common::complete_config();
    config.post_processing.strip_external_links = true;
    assert!(config.validate().is_err());
    config.post_processing.site_host = Some("example.com".to_string());
    assert!(config.validate().is_ok());
}

#[test]
fn test_applyOverrides_withLookup_shouldReplaceCredentials() {
    let mut config = Config::default();
    config.apply_overrides(|name| Some(format!("value-of-{}", name)));

    assert_eq!(config.content_store.base_url, format!("value-of-{}", ENV_STORE_BASE_URL));
    assert_eq!(config.content_store.api_token, format!("value-of-{}", ENV_STORE_API_TOKEN));
    assert_eq!(config.engine.auth_key, format!("value-of-{}", ENV_ENGINE_AUTH_KEY));
}

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefault() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("nested").join("polypress.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(config, Config::default());
    assert_eq!(Config::load(&path)?, config);
    Ok(())
}

#[test]
fn test_save_thenLoad_shouldKeepAllSections() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("config.json");

    let mut config = common::complete_config();
    config.canonical_locale = "de".to_string();
    config.engine.rate_limit = Some(30);
    config.pipeline.max_chunk_chars = 5000;
    config.post_processing.site_host = Some("example.com".to_string());
    config.log_level = LogLevel::Debug;
    config.save(&path)?;

    assert_eq!(Config::load(&path)?, config);
    Ok(())
}

#[test]
fn test_load_withMalformedFile_shouldFailWithPath() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("broken.json");
    std::fs::write(&path, "{ not json")?;

    let err = Config::load(&path).unwrap_err();
    assert!(err.to_string().contains("broken.json"));
    Ok(())
}

#[test]
fn test_logLevel_shouldMapToLevelFilter() {
    assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}
