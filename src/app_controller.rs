use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::providers::TranslationEngine;
use crate::providers::deepl::DeepL;
use crate::store::ContentStore;
use crate::store::strapi::StrapiStore;
use crate::translation::{LocaleResult, Orchestrator, ProgressCallback, TranslationSummary};

// @module: Application controller wiring configuration to the pipeline

/// How the entry to translate is identified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryTarget {
    /// Document identifier
    Id(String),
    /// Slug of the canonical-locale variant
    Slug(String),
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    orchestrator: Orchestrator,
    /// Draw a progress bar while locale jobs run
    show_progress: bool,
}

impl Controller {
    /// Create a controller talking to the configured Strapi instance and DeepL
    ///
    /// The configuration is validated first; a missing credential fails here,
    /// before any client is built.
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;

        let store = StrapiStore::new(
            &config.content_store.base_url,
            config.content_store.api_token.clone(),
            config.content_store.timeout_secs,
        )
        .context("Failed to create content store client")?;

        let engine = DeepL::new_with_config(
            config.engine.auth_key.clone(),
            config.engine.endpoint.clone(),
            config.engine.retry_count,
            config.engine.retry_backoff_ms,
            config.engine.rate_limit,
            config.engine.timeout_secs,
        )
        .context("Failed to create translation engine client")?;

        Self::with_adapters(config, Arc::new(store), Arc::new(engine))
    }

    /// Create a controller around already built adapters
    pub fn with_adapters(
        config: Config,
        store: Arc<dyn ContentStore>,
        engine: Arc<dyn TranslationEngine>,
    ) -> Result<Self> {
        let orchestrator = Orchestrator::from_config(&config, store, engine)
            .context("Failed to set up the translation pipeline")?;

        Ok(Self {
            config,
            orchestrator,
            show_progress: true,
        })
    }

    /// Disable the progress bar (tests, non-interactive runs)
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Translate one entry into `locale`, or into every non-canonical locale
    pub async fn translate(
        &self,
        target: &EntryTarget,
        endpoint: &str,
        locale: Option<&str>,
    ) -> Result<TranslationSummary> {
        let start_time = Instant::now();
        let progress_bar = self.progress_bar();
        let pb = progress_bar.clone();
        let progress: ProgressCallback = Arc::new(move |completed, total| {
            pb.set_length(total as u64);
            pb.set_position(completed as u64);
        });

        let result = match target {
            EntryTarget::Id(id) => {
                self.orchestrator
                    .translate_content(id, endpoint, locale, Some(progress))
                    .await
            }
            EntryTarget::Slug(slug) => {
                self.orchestrator
                    .translate_content_by_slug(slug, endpoint, locale, Some(progress))
                    .await
            }
        };
        progress_bar.finish_and_clear();

        let summary = result.with_context(|| format!("Failed to translate {}/{:?}", endpoint, target))?;
        self.report(&summary, start_time.elapsed());
        Ok(summary)
    }

    /// Locales configured in the content store
    pub async fn locales(&self) -> Result<Vec<String>> {
        self.orchestrator
            .get_locales()
            .await
            .context("Failed to list content store locales")
    }

    /// Create draft variants of an entry in every locale it lacks
    pub async fn seed(&self, entry_id: &str, endpoint: &str) -> Result<Vec<LocaleResult>> {
        let results = self
            .orchestrator
            .seed_locale_drafts(entry_id, endpoint)
            .await
            .with_context(|| format!("Failed to seed locale drafts for {}/{}", endpoint, entry_id))?;

        for result in results.iter().filter(|r| !r.success) {
            warn!("{}: {}", result.locale, result.error.as_deref().unwrap_or("unknown error"));
        }
        Ok(results)
    }

    /// Check that the translation engine accepts our credentials
    pub async fn check_engine(&self) -> Result<()> {
        let engine = self.orchestrator.gateway().engine();
        engine
            .test_connection()
            .await
            .with_context(|| format!("Failed to reach {}", engine.name()))
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress_bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} locales ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar.set_message("Translating");
        progress_bar
    }

    fn report(&self, summary: &TranslationSummary, elapsed: Duration) {
        for dependency in &summary.dependencies {
            if !dependency.found {
                warn!("Skipped {} {}: not found", dependency.kind, dependency.document_id);
            }
            for (locale, reason) in &dependency.failed {
                warn!("{} {} [{}]: {}", dependency.kind, dependency.document_id, locale, reason);
            }
        }

        for result in &summary.results {
            match (&result.success, &result.error) {
                (true, _) => info!("{}: {}", result.locale, result.title.as_deref().unwrap_or("")),
                (false, error) => error!("{}: {}", result.locale, error.as_deref().unwrap_or("unknown error")),
            }
        }

        info!("{} in {}", summary.message, Self::format_duration(elapsed));
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;

        if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
