/*!
 * In-memory content store.
 *
 * Keeps every locale variant of every document in process memory. Used by the
 * test suite and by dry runs; supports per-locale write failures and
 * artificial latency so pipeline edge cases can be reproduced.
 */

use async_trait::async_trait;
use log::debug;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use uuid::Uuid;

use crate::errors::StoreError;
use crate::language_utils::locale_codes_match;
use super::{ContentStore, Entry, EntryPayload, EntryRef, Localization, MediaRef, PublishOutcome, ANY_LOCALE};

/// A write the store accepted
#[derive(Debug, Clone, PartialEq)]
pub struct PublishRecord {
    pub type_id: String,
    pub document_id: String,
    pub locale: String,
    pub payload: EntryPayload,
    pub draft: bool,
}

type DocumentKey = (String, String);

/// Content store backed by hash maps
#[derive(Debug)]
pub struct MemoryStore {
    /// Locale variants per (type, document id), ordered by locale
    documents: RwLock<HashMap<DocumentKey, BTreeMap<String, Entry>>>,
    /// Locales the store reports
    locales: Vec<String>,
    /// Locale used when a read names none
    default_locale: String,
    /// Accepted writes, in order
    publishes: Mutex<Vec<PublishRecord>>,
    /// Locales whose writes are rejected
    failing_locales: RwLock<HashSet<String>>,
    /// Delay applied to every call
    latency: Option<Duration>,
    /// Calls received, all operations included
    call_count: AtomicUsize,
    /// Next numeric row id
    next_id: AtomicU64,
}

impl MemoryStore {
    /// Create a store reporting `locales`; the first one is the default locale
    pub fn new<S: AsRef<str>>(locales: &[S]) -> Self {
        let locales: Vec<String> = locales.iter().map(|l| l.as_ref().to_string()).collect();
        let default_locale = locales.first().cloned().unwrap_or_else(|| "en".to_string());
        Self {
            documents: RwLock::new(HashMap::new()),
            locales,
            default_locale,
            publishes: Mutex::new(Vec::new()),
            failing_locales: RwLock::new(HashSet::new()),
            latency: None,
            call_count: AtomicUsize::new(0),
            next_id: AtomicU64::new(1),
        }
    }

    /// Delay every call by `ms` milliseconds
    pub fn with_latency(mut self, ms: u64) -> Self {
        self.latency = Some(Duration::from_millis(ms));
        self
    }

    /// Store a variant directly, bypassing the write log
    ///
    /// An empty `document_id` gets a fresh one; a missing locale means the
    /// default locale. Returns the document id.
    pub fn insert(&self, type_id: &str, mut entry: Entry) -> String {
        if entry.document_id.is_empty() {
            entry.document_id = Uuid::new_v4().simple().to_string();
        }
        let locale = entry.locale.clone().unwrap_or_else(|| self.default_locale.clone());
        entry.locale = Some(locale.clone());
        if entry.id.is_none() {
            entry.id = Some(self.next_id.fetch_add(1, Ordering::SeqCst));
        }
        entry.localizations = None;

        let document_id = entry.document_id.clone();
        self.documents
            .write()
            .entry((type_id.to_string(), document_id.clone()))
            .or_default()
            .insert(locale, entry);
        document_id
    }

    /// Reject every later write in `locale`
    pub fn fail_publishes_for(&self, locale: &str) {
        self.failing_locales.write().insert(locale.to_string());
    }

    /// All accepted writes
    pub fn publishes(&self) -> Vec<PublishRecord> {
        self.publishes.lock().clone()
    }

    /// Accepted writes for one document
    pub fn publishes_for(&self, type_id: &str, document_id: &str) -> Vec<PublishRecord> {
        self.publishes
            .lock()
            .iter()
            .filter(|p| p.type_id == type_id && p.document_id == document_id)
            .cloned()
            .collect()
    }

    /// Number of calls received through `ContentStore`
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Stored variant, without localizations
    pub fn variant(&self, type_id: &str, document_id: &str, locale: &str) -> Option<Entry> {
        self.documents
            .read()
            .get(&(type_id.to_string(), document_id.to_string()))
            .and_then(|variants| variants.get(locale).cloned())
    }

    /// Locales a document exists in
    pub fn variant_locales(&self, type_id: &str, document_id: &str) -> Vec<String> {
        self.documents
            .read()
            .get(&(type_id.to_string(), document_id.to_string()))
            .map(|variants| variants.keys().cloned().collect())
            .unwrap_or_default()
    }

    async fn enter(&self) {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    /// Pick the variant a read asks for and attach its sibling locales
    fn select(&self, variants: &BTreeMap<String, Entry>, locale: Option<&str>) -> Option<Entry> {
        let selected = match locale {
            Some(ANY_LOCALE) => variants
                .get(&self.default_locale)
                .or_else(|| variants.values().next()),
            Some(locale) => variants
                .iter()
                .find(|(code, _)| locale_codes_match(code, locale))
                .map(|(_, entry)| entry),
            None => variants.get(&self.default_locale),
        }?;

        let mut entry = selected.clone();
        let own = entry.locale.clone().unwrap_or_default();
        entry.localizations = Some(
            variants
                .keys()
                .filter(|code| **code != own)
                .map(|code| Localization {
                    locale: code.clone(),
                    document_id: Some(entry.document_id.clone()),
                })
                .collect(),
        );
        Some(entry)
    }

    fn apply(entry: &mut Entry, payload: &EntryPayload) {
        if let Some(slug) = &payload.slug {
            entry.slug = Some(slug.clone());
        }
        if let Some(title) = &payload.title {
            entry.title = Some(title.clone());
        }
        if let Some(content) = &payload.content {
            entry.content = Some(content.clone());
        }
        if let Some(name) = &payload.name {
            entry.name = Some(name.clone());
        }
        if let Some(description) = &payload.description {
            entry.description = Some(description.clone());
        }
        if let Some(category) = &payload.category {
            entry.category = Some(EntryRef::new(category.clone()));
        }
        if let Some(tags) = &payload.tags {
            entry.tags = Some(tags.iter().map(EntryRef::new).collect());
        }
        if let Some(cover) = payload.cover_picture {
            entry.cover_picture = Some(MediaRef { id: cover });
        }
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn get_entry(
        &self,
        type_id: &str,
        id: &str,
        locale: Option<&str>,
        _populate: Option<&str>,
    ) -> Result<Option<Entry>, StoreError> {
        self.enter().await;
        let documents = self.documents.read();
        Ok(documents
            .get(&(type_id.to_string(), id.to_string()))
            .and_then(|variants| self.select(variants, locale)))
    }

    async fn get_entry_by_slug(
        &self,
        type_id: &str,
        slug: &str,
        locale: Option<&str>,
        _populate: Option<&str>,
    ) -> Result<Option<Entry>, StoreError> {
        self.enter().await;
        let documents = self.documents.read();
        let mut keys: Vec<&DocumentKey> = documents.keys().filter(|(t, _)| t == type_id).collect();
        keys.sort();

        Ok(keys.into_iter().find_map(|key| {
            documents
                .get(key)
                .and_then(|variants| self.select(variants, locale))
                .filter(|entry| entry.slug.as_deref() == Some(slug))
        }))
    }

    async fn publish_entry(
        &self,
        type_id: &str,
        id: &str,
        locale: &str,
        payload: &EntryPayload,
        draft: bool,
    ) -> Result<PublishOutcome, StoreError> {
        self.enter().await;

        if self.failing_locales.read().contains(locale) {
            return Err(StoreError::ApiError {
                status_code: 400,
                message: format!("Writes in locale {} are rejected", locale),
            });
        }

        let mut documents = self.documents.write();
        let variants = documents
            .get_mut(&(type_id.to_string(), id.to_string()))
            .ok_or_else(|| StoreError::ApiError {
                status_code: 404,
                message: format!("Document {}/{} not found", type_id, id),
            })?;

        let next_id = &self.next_id;
        let entry = variants.entry(locale.to_string()).or_insert_with(|| Entry {
            id: Some(next_id.fetch_add(1, Ordering::SeqCst)),
            document_id: id.to_string(),
            locale: Some(locale.to_string()),
            ..Default::default()
        });
        Self::apply(entry, payload);
        entry.published_at = if draft { None } else { Some(chrono::Utc::now().to_rfc3339()) };
        let title = entry.title.clone();
        drop(documents);

        debug!("Memory store wrote {}/{} [{}] (draft: {})", type_id, id, locale, draft);
        self.publishes.lock().push(PublishRecord {
            type_id: type_id.to_string(),
            document_id: id.to_string(),
            locale: locale.to_string(),
            payload: payload.clone(),
            draft,
        });

        Ok(PublishOutcome { title })
    }

    async fn get_all_locales(&self) -> Result<Vec<String>, StoreError> {
        self.enter().await;
        Ok(self.locales.clone())
    }
}
