/*!
 * Locale and entity orchestration.
 *
 * Given one canonical entry, works out which locales still need a
 * translation, localizes the category and tags the entry points to, then runs
 * one job per target locale: decompose, translate, recompose, clean, split
 * back into title and content and store a draft. Locale jobs run
 * concurrently and fail independently.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::app_config::Config;
use crate::errors::PipelineError;
use crate::language_utils::locale_codes_match;
use crate::markup::{self, ExternalLinkStripper, KeywordLinker, PostProcessor};
use crate::providers::TranslationEngine;
use crate::store::{ContentStore, Entry, EntryPayload, POPULATE_ALL};
use super::cache::ChunkCache;
use super::dependencies::{DependencyKind, DependencyOutcome, DependencyResolver};
use super::gateway::TranslationGateway;

/// Closing tag of the synthetic heading that carries the title
const TITLE_END: &str = "</h1>";

static TITLE_START_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*<h1\b[^>]*>").unwrap());

/// Called with `(completed, total)` after each locale job
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// One entry and one target locale, processed end to end
#[derive(Debug, Clone)]
pub struct TranslationJob {
    /// Canonical entry shared by all jobs of an invocation
    pub entry: Arc<Entry>,
    /// Content-type endpoint, e.g. "articles"
    pub endpoint: String,
    pub target_locale: String,
}

/// Result of one locale job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleResult {
    pub locale: String,
    pub success: bool,
    /// Title the store reported for the written draft
    pub title: Option<String>,
    pub error: Option<String>,
}

impl LocaleResult {
    fn ok(locale: &str, title: Option<String>) -> Self {
        Self { locale: locale.to_string(), success: true, title, error: None }
    }

    fn failed(locale: &str, error: &PipelineError) -> Self {
        Self { locale: locale.to_string(), success: false, title: None, error: Some(error.to_string()) }
    }
}

/// Result of a whole invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationSummary {
    /// True when every locale job succeeded
    pub success: bool,
    pub message: String,
    /// One result per target locale, in target order
    pub results: Vec<LocaleResult>,
    /// One outcome per category or tag the entry references
    pub dependencies: Vec<DependencyOutcome>,
}

impl TranslationSummary {
    pub fn failed_locales(&self) -> Vec<&str> {
        self.results.iter().filter(|r| !r.success).map(|r| r.locale.as_str()).collect()
    }
}

/// Split a translated `<h1>title</h1>content` document back into its fields
pub fn split_title(html: &str) -> Result<(String, String), PipelineError> {
    let end = html.find(TITLE_END).ok_or_else(|| {
        PipelineError::Markup(format!("translated document lost its {} heading", TITLE_END))
    })?;
    let title = TITLE_START_REGEX.replace(&html[..end], "").trim().to_string();
    let content = html[end + TITLE_END.len()..].to_string();
    Ok((title, content))
}

/// Drives translation of entries and their dependencies
#[derive(Debug)]
pub struct Orchestrator {
    store: Arc<dyn ContentStore>,
    gateway: TranslationGateway,
    resolver: DependencyResolver,
    canonical_locale: String,
    concurrent_locales: usize,
    post_processors: Vec<Arc<dyn PostProcessor>>,
}

impl Orchestrator {
    /// Create an orchestrator with the default canonical locale and limits
    pub fn new(store: Arc<dyn ContentStore>, gateway: TranslationGateway) -> Self {
        let resolver = DependencyResolver::new(store.clone(), gateway.clone());
        Self {
            store,
            gateway,
            resolver,
            canonical_locale: "en".to_string(),
            concurrent_locales: 4,
            post_processors: Vec::new(),
        }
    }

    /// Build an orchestrator around the given adapters using `config`
    ///
    /// Fails with `PipelineError::Configuration` before any adapter is used.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn ContentStore>,
        engine: Arc<dyn TranslationEngine>,
    ) -> Result<Self, PipelineError> {
        config.validate_pipeline()?;
        crate::language_utils::validate_locale(&config.canonical_locale)
            .map_err(|e| PipelineError::Configuration(e.to_string()))?;

        let gateway = TranslationGateway::new(engine)
            .with_max_chunk_chars(config.pipeline.max_chunk_chars)
            .with_concurrency(config.pipeline.concurrent_chunk_requests)
            .with_cache(ChunkCache::new(config.pipeline.cache_enabled));

        let mut orchestrator = Self::new(store, gateway)
            .with_canonical_locale(&config.canonical_locale)
            .with_concurrent_locales(config.pipeline.concurrent_locales);

        let post = &config.post_processing;
        if post.strip_external_links {
            orchestrator = orchestrator.with_post_processor(Arc::new(ExternalLinkStripper::new(post.site_host.clone())));
        }
        if !post.keyword_links.is_empty() {
            orchestrator = orchestrator.with_post_processor(Arc::new(KeywordLinker::new(post.keyword_links.clone())));
        }
        Ok(orchestrator)
    }

    pub fn with_canonical_locale(mut self, locale: &str) -> Self {
        self.canonical_locale = locale.to_string();
        self
    }

    pub fn with_concurrent_locales(mut self, concurrent_locales: usize) -> Self {
        self.concurrent_locales = concurrent_locales.max(1);
        self
    }

    /// Append a hook run on every translated document before it is split
    pub fn with_post_processor(mut self, processor: Arc<dyn PostProcessor>) -> Self {
        self.post_processors.push(processor);
        self
    }

    pub fn canonical_locale(&self) -> &str {
        &self.canonical_locale
    }

    pub fn gateway(&self) -> &TranslationGateway {
        &self.gateway
    }

    /// All locales the store knows
    pub async fn get_locales(&self) -> Result<Vec<String>, PipelineError> {
        Ok(self.store.get_all_locales().await?)
    }

    /// Translate an entry into `target_locale`, or into every other locale
    pub async fn translate_content(
        &self,
        entry_id: &str,
        endpoint: &str,
        target_locale: Option<&str>,
        progress: Option<ProgressCallback>,
    ) -> Result<TranslationSummary, PipelineError> {
        let entry = self
            .store
            .get_entry(endpoint, entry_id, Some(&self.canonical_locale), Some(POPULATE_ALL))
            .await?
            .ok_or_else(|| self.not_found(endpoint, entry_id))?;

        self.run(Arc::new(entry), endpoint, target_locale, progress).await
    }

    /// Same as `translate_content`, finding the canonical entry by slug
    pub async fn translate_content_by_slug(
        &self,
        slug: &str,
        endpoint: &str,
        target_locale: Option<&str>,
        progress: Option<ProgressCallback>,
    ) -> Result<TranslationSummary, PipelineError> {
        let entry = self
            .store
            .get_entry_by_slug(endpoint, slug, Some(&self.canonical_locale), Some(POPULATE_ALL))
            .await?
            .ok_or_else(|| self.not_found(endpoint, slug))?;

        self.run(Arc::new(entry), endpoint, target_locale, progress).await
    }

    /// Write a draft copy of the canonical entry into every locale it lacks
    ///
    /// Locales that already have a variant are left alone.
    pub async fn seed_locale_drafts(&self, entry_id: &str, endpoint: &str) -> Result<Vec<LocaleResult>, PipelineError> {
        let entry = self
            .store
            .get_entry(endpoint, entry_id, Some(&self.canonical_locale), Some(POPULATE_ALL))
            .await?
            .ok_or_else(|| self.not_found(endpoint, entry_id))?;

        let targets = self.resolve_targets(None).await?;
        let payload = EntryPayload::copy_of(&entry);
        let mut results = Vec::new();

        for locale in targets.iter().filter(|l| !entry.has_locale(l)) {
            match self.store.publish_entry(endpoint, entry_id, locale, &payload, true).await {
                Ok(outcome) => {
                    debug!("Seeded {} draft of {}/{}", locale, endpoint, entry_id);
                    results.push(LocaleResult::ok(locale, outcome.title));
                }
                Err(e) => {
                    let e = PipelineError::from(e);
                    warn!("Failed to seed {} draft of {}/{}: {}", locale, endpoint, entry_id, e);
                    results.push(LocaleResult::failed(locale, &e));
                }
            }
        }

        info!("Seeded {} locale draft(s) for {}/{}", results.len(), endpoint, entry_id);
        Ok(results)
    }

    fn not_found(&self, endpoint: &str, entry_id: &str) -> PipelineError {
        PipelineError::NotFound {
            endpoint: endpoint.to_string(),
            entry_id: entry_id.to_string(),
            locale: self.canonical_locale.clone(),
        }
    }

    /// Target locales for an invocation, canonical locale excluded
    async fn resolve_targets(&self, target_locale: Option<&str>) -> Result<Vec<String>, PipelineError> {
        let candidates = match target_locale {
            Some(locale) => vec![locale.to_string()],
            None => self.store.get_all_locales().await?,
        };

        Ok(candidates
            .into_iter()
            .filter(|l| !locale_codes_match(l, &self.canonical_locale))
            .collect())
    }

    async fn run(
        &self,
        entry: Arc<Entry>,
        endpoint: &str,
        target_locale: Option<&str>,
        progress: Option<ProgressCallback>,
    ) -> Result<TranslationSummary, PipelineError> {
        let targets = self.resolve_targets(target_locale).await?;
        if targets.is_empty() {
            info!("Nothing to translate for {}/{}", endpoint, entry.document_id);
            return Ok(TranslationSummary {
                success: true,
                message: "No target locales".to_string(),
                results: Vec::new(),
                dependencies: Vec::new(),
            });
        }

        info!(
            "Translating {}/{} into {}",
            endpoint,
            entry.document_id,
            targets.join(", ")
        );

        let dependencies = self.resolve_dependencies(&entry, &targets).await;

        let total = targets.len();
        let completed = Arc::new(AtomicUsize::new(0));
        let jobs = targets.iter().enumerate().map(|(index, locale)| {
            let job = TranslationJob {
                entry: entry.clone(),
                endpoint: endpoint.to_string(),
                target_locale: locale.clone(),
            };
            (index, job)
        });

        let mut results = stream::iter(jobs)
            .map(|(index, job)| {
                let completed = completed.clone();
                let progress = progress.clone();
                async move {
                    let result = match self.translate_job(&job).await {
                        Ok(title) => {
                            info!("Translated {}/{} into {}", job.endpoint, job.entry.document_id, job.target_locale);
                            LocaleResult::ok(&job.target_locale, title)
                        }
                        Err(e) => {
                            error!("Failed to translate {}/{} into {}: {}", job.endpoint, job.entry.document_id, job.target_locale, e);
                            LocaleResult::failed(&job.target_locale, &e)
                        }
                    };

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(progress) = &progress {
                        progress(done, total);
                    }
                    (index, result)
                }
            })
            .buffer_unordered(self.concurrent_locales)
            .collect::<Vec<_>>()
            .await;

        results.sort_by_key(|(index, _)| *index);
        let results: Vec<LocaleResult> = results.into_iter().map(|(_, r)| r).collect();

        let succeeded = results.iter().filter(|r| r.success).count();
        Ok(TranslationSummary {
            success: succeeded == total,
            message: format!("Translated {}/{} locale(s)", succeeded, total),
            results,
            dependencies,
        })
    }

    /// Localize the category, then each tag, into every target locale
    async fn resolve_dependencies(&self, entry: &Entry, targets: &[String]) -> Vec<DependencyOutcome> {
        let mut outcomes = Vec::new();

        if let Some(category) = &entry.category {
            outcomes.push(
                self.resolver
                    .resolve(DependencyKind::Category, &category.document_id, targets)
                    .await,
            );
        }
        for tag in entry.tag_ids() {
            outcomes.push(self.resolver.resolve(DependencyKind::Tag, &tag, targets).await);
        }
        outcomes
    }

    /// Translate and store one locale; returns the stored title
    async fn translate_job(&self, job: &TranslationJob) -> Result<Option<String>, PipelineError> {
        let entry = &job.entry;
        let locale = job.target_locale.as_str();

        let source = format!(
            "<h1>{}</h1>{}",
            entry.title.as_deref().unwrap_or_default(),
            entry.content.as_deref().unwrap_or_default()
        );
        let (skeleton, ledger) = markup::decompose(&source);

        let translated = self.gateway.translate_with_report(&skeleton, locale).await;
        if !translated.is_complete() {
            warn!(
                "{} of {} chunk(s) kept source text for {}",
                translated.failed_chunks.len(),
                translated.chunk_count,
                locale
            );
        }

        let recomposed = markup::recompose_with_report(&translated.html, &ledger);
        if !recomposed.is_aligned() {
            warn!(
                "Tag sequence changed in {} translation: {} tag(s) restored, {} without attributes",
                locale, recomposed.restored, recomposed.unmatched
            );
        }

        let mut html = markup::clean_for_store(&recomposed.html);
        for processor in &self.post_processors {
            html = processor.process(&html, locale);
        }

        let (title, content) = split_title(&html)?;

        let payload = EntryPayload {
            slug: entry.slug.clone(),
            title: Some(title.clone()),
            content: Some(content),
            category: entry.category.as_ref().map(|c| c.document_id.clone()),
            tags: entry.tags.as_ref().map(|_| entry.tag_ids()),
            cover_picture: entry.cover_picture.map(|c| c.id),
            ..Default::default()
        };

        let outcome = self
            .store
            .publish_entry(&job.endpoint, &entry.document_id, locale, &payload, true)
            .await?;
        Ok(outcome.title.or(Some(title)))
    }
}
