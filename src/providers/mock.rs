/*!
 * Mock translation engine for testing.
 *
 * This module provides a mock engine that simulates different behaviors:
 * - `MockEngine::working()` - Marks every text run with the target locale
 * - `MockEngine::identity()` - Returns the input unchanged
 * - `MockEngine::intermittent(n)` - Fails every Nth request
 * - `MockEngine::failing()` - Always fails with an error
 * - `MockEngine::failing_on(marker)` - Fails requests containing a marker
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::markup::tags::{tokenize, Token};
use super::{TagHandlingOptions, TranslationEngine};

/// A request the mock engine received
#[derive(Debug, Clone)]
pub struct MockRequest {
    /// The text to translate
    pub text: String,
    /// Target locale as passed by the pipeline
    pub target_locale: String,
    /// Markup options sent with the request
    pub options: TagHandlingOptions,
}

/// Behavior mode for the mock engine
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Prefix every non-blank text run with `[locale] `
    Working,
    /// Return the input unchanged
    Identity,
    /// Fail every Nth request (1-based)
    Intermittent { fail_every: usize },
    /// Always fail
    Failing,
    /// Fail requests whose text contains the marker, translate the rest
    FailingOn(String),
    /// Translate after a delay (for concurrency testing)
    Slow { delay_ms: u64 },
}

/// Mock engine for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockEngine {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter for intermittent failures
    request_count: Arc<AtomicUsize>,
    /// Every request received, in arrival order
    requests: Arc<Mutex<Vec<MockRequest>>>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&str, &str) -> String>,
}

impl MockEngine {
    /// Create a new mock engine with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            custom_response: None,
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn identity() -> Self {
        Self::new(MockBehavior::Identity)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn failing_on(marker: impl Into<String>) -> Self {
        Self::new(MockBehavior::FailingOn(marker.into()))
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Set a custom response generator `(text, locale) -> translation`
    pub fn with_custom_response(mut self, generator: fn(&str, &str) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Snapshot of all requests received so far
    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().clone()
    }

    /// Requests received for one target locale
    pub fn requests_for(&self, locale: &str) -> Vec<MockRequest> {
        self.requests.lock().iter().filter(|r| r.target_locale == locale).cloned().collect()
    }

    /// The translation `Working` mode produces for `text`
    pub fn mark_text(text: &str, locale: &str) -> String {
        tokenize(text)
            .into_iter()
            .map(|token| match token {
                Token::Text(run) if !run.trim().is_empty() => format!("[{}] {}", locale, run),
                other => other.as_str().to_string(),
            })
            .collect()
    }

    fn respond(&self, text: &str, locale: &str) -> String {
        if let Some(generator) = self.custom_response {
            return generator(text, locale);
        }
        match self.behavior {
            MockBehavior::Identity => text.to_string(),
            _ => Self::mark_text(text, locale),
        }
    }
}

#[async_trait]
impl TranslationEngine for MockEngine {
    async fn translate_text(
        &self,
        text: &str,
        target_locale: &str,
        options: &TagHandlingOptions,
    ) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().push(MockRequest {
            text: text.to_string(),
            target_locale: target_locale.to_string(),
            options: options.clone(),
        });

        match &self.behavior {
            MockBehavior::Failing => {
                Err(ProviderError::ConnectionError("Mock engine failure".to_string()))
            }
            MockBehavior::Intermittent { fail_every } if *fail_every > 0 && count % fail_every == 0 => {
                Err(ProviderError::ApiError {
                    status_code: 503,
                    message: format!("Mock intermittent failure on request {}", count),
                })
            }
            MockBehavior::FailingOn(marker) if text.contains(marker.as_str()) => {
                Err(ProviderError::ParseError("Mock malformed response".to_string()))
            }
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(std::time::Duration::from_millis(*delay_ms)).await;
                Ok(self.respond(text, target_locale))
            }
            _ => Ok(self.respond(text, target_locale)),
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Mock engine failure".to_string())),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "Mock"
    }
}
