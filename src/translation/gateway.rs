/*!
 * Translation gateway.
 *
 * Sends a document to the engine chunk by chunk. Chunks are translated
 * concurrently up to a configured limit and joined back in source order. A
 * chunk the engine fails on keeps its source text so one bad request never
 * loses the rest of the document.
 */

use std::sync::Arc;
use futures::stream::{self, StreamExt};
use log::{debug, warn};

use crate::errors::{PipelineError, ProviderError};
use crate::markup::{chunk, DEFAULT_MAX_CHUNK_CHARS};
use crate::providers::{TagHandlingOptions, TranslationEngine};
use super::cache::ChunkCache;

/// Default number of chunk requests in flight per document
pub const DEFAULT_CONCURRENT_CHUNKS: usize = 3;

/// Outcome of translating one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayReport {
    /// Translated document, source text where a chunk failed
    pub html: String,
    /// Number of chunks sent
    pub chunk_count: usize,
    /// Indices of the chunks that kept their source text
    pub failed_chunks: Vec<usize>,
}

impl GatewayReport {
    pub fn is_complete(&self) -> bool {
        self.failed_chunks.is_empty()
    }
}

/// Chunked, order-preserving front end to a translation engine
#[derive(Debug, Clone)]
pub struct TranslationGateway {
    /// The engine doing the work
    engine: Arc<dyn TranslationEngine>,
    /// Markup options sent with every chunk
    options: TagHandlingOptions,
    /// Character budget per chunk
    max_chunk_chars: usize,
    /// Maximum number of chunk requests in flight
    max_concurrent_chunks: usize,
    /// Translated chunks shared across documents
    cache: ChunkCache,
}

impl TranslationGateway {
    /// Create a gateway with default limits and an enabled cache
    pub fn new(engine: Arc<dyn TranslationEngine>) -> Self {
        Self {
            engine,
            options: TagHandlingOptions::default(),
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            max_concurrent_chunks: DEFAULT_CONCURRENT_CHUNKS,
            cache: ChunkCache::default(),
        }
    }

    pub fn with_max_chunk_chars(mut self, max_chunk_chars: usize) -> Self {
        self.max_chunk_chars = max_chunk_chars.max(1);
        self
    }

    pub fn with_concurrency(mut self, max_concurrent_chunks: usize) -> Self {
        self.max_concurrent_chunks = max_concurrent_chunks.max(1);
        self
    }

    pub fn with_cache(mut self, cache: ChunkCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_options(mut self, options: TagHandlingOptions) -> Self {
        self.options = options;
        self
    }

    pub fn cache(&self) -> &ChunkCache {
        &self.cache
    }

    pub fn engine(&self) -> &Arc<dyn TranslationEngine> {
        &self.engine
    }

    /// Translate `html` into `target_locale`
    pub async fn translate(&self, html: &str, target_locale: &str) -> String {
        self.translate_with_report(html, target_locale).await.html
    }

    /// Translate `html` into `target_locale`, reporting failed chunks
    pub async fn translate_with_report(&self, html: &str, target_locale: &str) -> GatewayReport {
        let chunks = chunk(html, self.max_chunk_chars);
        let chunk_count = chunks.len();
        debug!(
            "Translating {} chars into {} as {} chunk(s) with {}",
            html.len(),
            target_locale,
            chunk_count,
            self.engine.name()
        );

        let mut results = stream::iter(chunks.into_iter().enumerate())
            .map(|(index, source)| async move {
                let outcome = self.translate_chunk(&source, target_locale).await;
                (index, source, outcome)
            })
            .buffer_unordered(self.max_concurrent_chunks)
            .collect::<Vec<_>>()
            .await;

        // Sort results by chunk index to maintain original order
        results.sort_by_key(|(index, _, _)| *index);

        let mut html = String::with_capacity(html.len());
        let mut failed_chunks = Vec::new();
        for (index, source, outcome) in results {
            match outcome {
                Ok(translated) => html.push_str(&translated),
                Err(source_error) => {
                    let error = PipelineError::ChunkTranslation {
                        chunk_index: index,
                        locale: target_locale.to_string(),
                        source: source_error,
                    };
                    warn!("{}; keeping source text", error);
                    html.push_str(&source);
                    failed_chunks.push(index);
                }
            }
        }

        GatewayReport { html, chunk_count, failed_chunks }
    }

    async fn translate_chunk(&self, source: &str, target_locale: &str) -> Result<String, ProviderError> {
        if let Some(cached) = self.cache.get(source, target_locale) {
            return Ok(cached);
        }

        let translated = self.engine.translate_text(source, target_locale, &self.options).await?;
        self.cache.store(source, target_locale, &translated);
        Ok(translated)
    }
}
