use std::time::{Duration, Instant};
use async_trait::async_trait;
use log::{debug, error, warn};
use parking_lot::Mutex;
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::errors::ProviderError;
use crate::language_utils;
use super::{TagHandlingOptions, TranslationEngine};

/// Public API endpoint for paid accounts
pub const DEEPL_PRO_ENDPOINT: &str = "https://api.deepl.com";

/// Public API endpoint for free accounts (keys ending in ":fx")
pub const DEEPL_FREE_ENDPOINT: &str = "https://api-free.deepl.com";

/// DeepL client for markup-aware translation
#[derive(Debug)]
pub struct DeepL {
    /// HTTP client for API requests
    client: Client,
    /// Authentication key
    auth_key: String,
    /// API base URL
    endpoint: String,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
    /// Minimum spacing between requests derived from the rate limit
    min_interval: Option<Duration>,
    /// Earliest instant the next request may be sent
    next_slot: Mutex<Option<Instant>>,
}

/// Translate response
#[derive(Debug, Deserialize)]
pub struct DeepLResponse {
    /// One translation per submitted text
    pub translations: Vec<DeepLTranslation>,
}

/// Individual translation in a DeepL response
#[derive(Debug, Deserialize)]
pub struct DeepLTranslation {
    /// Source language the engine detected
    #[serde(default)]
    pub detected_source_language: Option<String>,
    /// Translated text
    pub text: String,
}

/// Error body returned by DeepL
#[derive(Debug, Deserialize)]
struct DeepLErrorBody {
    message: Option<String>,
}

impl DeepL {
    /// Create a new DeepL client with default retry settings
    pub fn new(auth_key: impl Into<String>, endpoint: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new_with_config(auth_key, endpoint, 3, 1000, None, 60)
    }

    /// Create a new DeepL client
    ///
    /// An empty endpoint selects the free or pro API based on the key.
    pub fn new_with_config(
        auth_key: impl Into<String>,
        endpoint: impl Into<String>,
        max_retries: u32,
        backoff_base_ms: u64,
        rate_limit: Option<u32>,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        let auth_key = auth_key.into();
        let endpoint = endpoint.into();
        let endpoint = if endpoint.trim().is_empty() {
            Self::default_endpoint_for_key(&auth_key).to_string()
        } else {
            endpoint.trim_end_matches('/').to_string()
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            auth_key,
            endpoint,
            max_retries,
            backoff_base_ms,
            min_interval: rate_limit
                .filter(|r| *r > 0)
                .map(|r| Duration::from_millis(60_000 / r as u64)),
            next_slot: Mutex::new(None),
        })
    }

    /// Endpoint matching the account type of an auth key
    pub fn default_endpoint_for_key(auth_key: &str) -> &'static str {
        if auth_key.trim().ends_with(":fx") {
            DEEPL_FREE_ENDPOINT
        } else {
            DEEPL_PRO_ENDPOINT
        }
    }

    /// Base URL in use
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build the form fields for one request
    pub fn form_fields(text: &str, target_lang: &str, options: &TagHandlingOptions) -> Vec<(&'static str, String)> {
        vec![
            ("text", text.to_string()),
            ("target_lang", target_lang.to_string()),
            ("tag_handling", options.tag_handling.as_str().to_string()),
            ("ignore_tags", options.ignore_tags.join(",")),
            ("splitting_tags", options.splitting_tags.join(",")),
            ("non_splitting_tags", options.non_splitting_tags.join(",")),
            ("preserve_formatting", if options.preserve_formatting { "1" } else { "0" }.to_string()),
        ]
    }

    /// Wait until the rate limit allows another request
    async fn wait_for_slot(&self) {
        let Some(interval) = self.min_interval else {
            return;
        };

        let wait = {
            let mut next_slot = self.next_slot.lock();
            let now = Instant::now();
            let slot = next_slot.map_or(now, |s| s.max(now));
            *next_slot = Some(slot + interval);
            slot - now
        };

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }

    /// Backoff before retry number `attempt` (1-based), with jitter
    fn backoff(&self, attempt: u32) -> Duration {
        let base = self.backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
        let jitter = if base > 1 { rand::rng().random_range(0..=base / 2) } else { 0 };
        Duration::from_millis(base + jitter)
    }

    /// Send one request without retrying
    async fn send_once(&self, form: &[(&'static str, String)]) -> Result<String, ProviderError> {
        let url = format!("{}/v2/translate", self.endpoint);

        self.wait_for_slot().await;

        let response = self.client.post(&url)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.auth_key))
            .form(form)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to send request to DeepL API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            let message = serde_json::from_str::<DeepLErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or(body);
            error!("DeepL API error ({}): {}", status, message);
            return Err(Self::map_status(status, message));
        }

        let parsed = response.json::<DeepLResponse>().await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse DeepL API response: {}", e)))?;

        Self::extract_text(parsed)
    }

    /// Map a non-success status to a provider error
    fn map_status(status: StatusCode, message: String) -> ProviderError {
        match status.as_u16() {
            401 | 403 => ProviderError::AuthenticationError(message),
            429 => ProviderError::RateLimitExceeded(message),
            456 => ProviderError::QuotaExceeded(message),
            code => ProviderError::ApiError { status_code: code, message },
        }
    }

    /// Extract the single translation from a response
    pub fn extract_text(response: DeepLResponse) -> Result<String, ProviderError> {
        response.translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or_else(|| ProviderError::ParseError("Response contained no translations".to_string()))
    }
}

#[async_trait]
impl TranslationEngine for DeepL {
    async fn translate_text(
        &self,
        text: &str,
        target_locale: &str,
        options: &TagHandlingOptions,
    ) -> Result<String, ProviderError> {
        let target_lang = language_utils::to_engine_code(target_locale)
            .map_err(|e| ProviderError::UnsupportedLanguage(e.to_string()))?;
        let form = Self::form_fields(text, &target_lang, options);

        let mut attempt = 0;
        loop {
            match self.send_once(&form).await {
                Ok(translated) => return Ok(translated),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.backoff(attempt);
                    warn!("DeepL request failed ({}), retry {}/{} in {:?}", e, attempt, self.max_retries, delay);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let url = format!("{}/v2/usage", self.endpoint);
        let response = self.client.get(&url)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.auth_key))
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status(status, body));
        }
        debug!("DeepL connection OK ({})", self.endpoint);
        Ok(())
    }

    fn name(&self) -> &str {
        "DeepL"
    }
}
