/*!
 * Localization of the entities an entry references.
 *
 * Before an entry is translated, its category and tags must exist in every
 * target locale. Each one is read once, its missing locales are translated
 * from `name` and `description`, and the new variants are published under the
 * original slug. Locales that already exist are never touched again, so
 * repeated runs converge instead of duplicating variants.
 *
 * Work on a single entity is serialized inside the process: the resolver
 * holds a lock per entity and re-reads the entity's localizations after
 * acquiring it, so two concurrent jobs cannot both create the same variant.
 */

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::PipelineError;
use crate::store::{ContentStore, Entry, EntryPayload, ANY_LOCALE};
use super::gateway::TranslationGateway;

/// Joins name and description into one engine request
pub const FIELD_SENTINEL: &str = "<br>";

/// Relations to populate when reading a dependency
const DEPENDENCY_POPULATE: &str = "localizations";

static PARAGRAPH_TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?p\s*>").unwrap());

/// Engines may return the sentinel as `<br/>` or `<br />`
static SENTINEL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());

/// The kinds of entity an entry depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    Category,
    Tag,
}

impl DependencyKind {
    /// Content-store endpoint for this kind
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Category => "categories",
            Self::Tag => "tags",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Category => write!(f, "category"),
            Self::Tag => write!(f, "tag"),
        }
    }
}

/// What happened to one dependent entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyOutcome {
    pub kind: DependencyKind,
    pub document_id: String,
    /// False when the entity could not be read; nothing else was attempted
    pub found: bool,
    /// Locales created by this run
    pub created: Vec<String>,
    /// Locales that already existed
    pub skipped: Vec<String>,
    /// Locales that could not be created, with the reason
    pub failed: Vec<(String, String)>,
}

impl DependencyOutcome {
    fn new(kind: DependencyKind, document_id: &str) -> Self {
        Self {
            kind,
            document_id: document_id.to_string(),
            found: true,
            created: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.found && self.failed.is_empty()
    }
}

/// Join `name` and `description` into one engine payload
pub fn join_fields(name: &str, description: &str) -> String {
    format!("{}{}{}", name, FIELD_SENTINEL, description)
}

/// Split a translated payload back into `(name, description)`
///
/// Stray paragraph tags are removed from both halves. A payload that lost the
/// sentinel becomes a name with an empty description.
pub fn split_fields(translated: &str) -> (String, String) {
    let mut parts = SENTINEL_REGEX.splitn(translated, 2);
    let name = parts.next().unwrap_or_default();
    let description = parts.next().unwrap_or_default();

    let clean = |s: &str| PARAGRAPH_TAG_REGEX.replace_all(s, "").trim().to_string();
    (clean(name), clean(description))
}

/// Creates missing locale variants of categories and tags
#[derive(Debug)]
pub struct DependencyResolver {
    store: Arc<dyn ContentStore>,
    gateway: TranslationGateway,
    /// One lock per (endpoint, document id)
    locks: parking_lot::Mutex<HashMap<(&'static str, String), Arc<tokio::sync::Mutex<()>>>>,
}

impl DependencyResolver {
    pub fn new(store: Arc<dyn ContentStore>, gateway: TranslationGateway) -> Self {
        Self {
            store,
            gateway,
            locks: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    fn lock_for(&self, kind: DependencyKind, document_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .lock()
            .entry((kind.endpoint(), document_id.to_string()))
            .or_default()
            .clone()
    }

    /// Make sure the entity exists in every locale of `target_locales`
    ///
    /// Never fails: read and write failures are logged and recorded in the
    /// outcome so the entry pass can go on.
    pub async fn resolve(
        &self,
        kind: DependencyKind,
        document_id: &str,
        target_locales: &[String],
    ) -> DependencyOutcome {
        let lock = self.lock_for(kind, document_id);
        let guard = lock.lock().await;
        let outcome = self.resolve_locked(kind, document_id, target_locales).await;
        drop(guard);
        self.release_lock(kind, document_id, lock);
        outcome
    }

    /// Drop the entity's lock entry once no other job holds or awaits it
    fn release_lock(&self, kind: DependencyKind, document_id: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.locks.lock();
        // One reference in the map plus ours
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&(kind.endpoint(), document_id.to_string()));
        }
    }

    /// Number of entities with a live lock entry
    pub fn lock_count(&self) -> usize {
        self.locks.lock().len()
    }

    async fn resolve_locked(
        &self,
        kind: DependencyKind,
        document_id: &str,
        target_locales: &[String],
    ) -> DependencyOutcome {
        let mut outcome = DependencyOutcome::new(kind, document_id);
        let endpoint = kind.endpoint();

        // Read after locking so variants created by a concurrent job are seen
        let entity = match self
            .store
            .get_entry(endpoint, document_id, Some(ANY_LOCALE), Some(DEPENDENCY_POPULATE))
            .await
        {
            Ok(Some(entity)) => entity,
            Ok(None) => {
                warn!("Skipping {} {}: not found", kind, document_id);
                outcome.found = false;
                return outcome;
            }
            Err(e) => {
                warn!("Skipping {} {}: {}", kind, document_id, e);
                outcome.found = false;
                return outcome;
            }
        };

        for locale in target_locales {
            if entity.has_locale(locale) {
                debug!("{} {} already exists in {}", kind, document_id, locale);
                outcome.skipped.push(locale.clone());
                continue;
            }

            match self.localize(kind, &entity, locale).await {
                Ok(()) => outcome.created.push(locale.clone()),
                Err(e) => {
                    warn!("{}", e);
                    outcome.failed.push((locale.clone(), e.to_string()));
                }
            }
        }

        if !outcome.created.is_empty() {
            info!(
                "Localized {} {} into {}",
                kind,
                document_id,
                outcome.created.join(", ")
            );
        }
        outcome
    }

    async fn localize(&self, kind: DependencyKind, entity: &Entry, locale: &str) -> Result<(), PipelineError> {
        let payload = join_fields(
            entity.name.as_deref().unwrap_or_default(),
            entity.description.as_deref().unwrap_or_default(),
        );
        let report = self.gateway.translate_with_report(&payload, locale).await;
        if !report.is_complete() {
            // Source text must not be stored as a localization
            return Err(PipelineError::DependencyTranslation {
                endpoint: kind.endpoint().to_string(),
                document_id: entity.document_id.clone(),
                locale: locale.to_string(),
                reason: format!(
                    "engine failed on {} of {} chunk(s)",
                    report.failed_chunks.len(),
                    report.chunk_count
                ),
            });
        }
        let (name, description) = split_fields(&report.html);

        let payload = EntryPayload {
            slug: entity.slug.clone(),
            name: Some(name),
            description: Some(description),
            ..Default::default()
        };

        self.store
            .publish_entry(kind.endpoint(), &entity.document_id, locale, &payload, false)
            .await
            .map_err(|e| PipelineError::DependencyTranslation {
                endpoint: kind.endpoint().to_string(),
                document_id: entity.document_id.clone(),
                locale: locale.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }
}
