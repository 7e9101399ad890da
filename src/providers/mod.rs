/*!
 * Translation engine implementations.
 *
 * This module contains the engine interface used by the pipeline and the
 * clients implementing it:
 * - DeepL: markup-aware machine translation API
 * - Mock: deterministic engine for tests and dry runs
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::ProviderError;

/// How the engine should treat markup in the submitted text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TagHandling {
    /// Text is HTML; tags are kept and not translated
    #[default]
    Html,
    /// Text is XML
    Xml,
}

impl TagHandling {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Xml => "xml",
        }
    }
}

/// Markup-aware request options sent with every chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagHandlingOptions {
    /// Markup dialect of the submitted text
    pub tag_handling: TagHandling,
    /// Elements whose content is passed through untranslated
    pub ignore_tags: Vec<String>,
    /// Elements that always start a new sentence
    pub splitting_tags: Vec<String>,
    /// Elements never split mid-element
    pub non_splitting_tags: Vec<String>,
    /// Keep the source's punctuation and casing quirks
    pub preserve_formatting: bool,
}

impl Default for TagHandlingOptions {
    fn default() -> Self {
        let list = |tags: &[&str]| tags.iter().map(|t| t.to_string()).collect();
        Self {
            tag_handling: TagHandling::Html,
            ignore_tags: list(&["code", "pre"]),
            splitting_tags: list(&["p", "li", "div"]),
            non_splitting_tags: list(&["span", "strong", "em"]),
            preserve_formatting: true,
        }
    }
}

/// Common interface for all translation engines
///
/// The pipeline only talks to engines through this trait, so tests can swap
/// in the mock engine and the binary can pick a client from configuration.
#[async_trait]
pub trait TranslationEngine: Send + Sync + Debug {
    /// Translate `text` into `target_locale`
    ///
    /// # Arguments
    /// * `text` - The text or markup to translate
    /// * `target_locale` - Content-store locale code, e.g. "zh-Hans"
    /// * `options` - Markup handling options
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The translated text or an error
    async fn translate_text(
        &self,
        text: &str,
        target_locale: &str,
        options: &TagHandlingOptions,
    ) -> Result<String, ProviderError>;

    /// Test the connection to the engine
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Name used in log messages
    fn name(&self) -> &str;
}

pub mod deepl;
pub mod mock;
