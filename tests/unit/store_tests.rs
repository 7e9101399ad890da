/*!
 * Tests for the content store model and in-memory adapter
 */

use polypress::errors::StoreError;
use polypress::store::memory::MemoryStore;
use polypress::store::{endpoint_for_content_type, ContentStore, Entry, EntryPayload, ANY_LOCALE, POPULATE_ALL};
use crate::common;

#[tokio::test]
async fn test_getEntry_withCanonicalLocale_shouldReturnPopulatedArticle() {
    let store = common::seeded_store(&["en", "fr"]);

    let entry = store
        .get_entry("articles", common::ARTICLE_ID, Some("en"), Some(POPULATE_ALL))
        .await
        .unwrap()
        .expect("article should exist");

    assert_eq!(entry.title.as_deref(), Some("Bitcoin Basics"));
    assert_eq!(entry.category.map(|c| c.document_id), Some(common::CATEGORY_ID.to_string()));
    assert_eq!(entry.tags.map(|t| t.len()), Some(2));
    assert!(entry.localizations.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_getEntry_withAnyLocale_shouldFallBackToExistingVariant() {
    let store = MemoryStore::new(&["en", "fr"]);
    store.insert("tags", Entry {
        document_id: "t".to_string(),
        locale: Some("fr".to_string()),
        name: Some("Étiquette".to_string()),
        ..Default::default()
    });

    let entry = store.get_entry("tags", "t", Some(ANY_LOCALE), None).await.unwrap().unwrap();
    assert_eq!(entry.locale.as_deref(), Some("fr"));
    assert!(store.get_entry("tags", "t", None, None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_publishEntry_twice_shouldUpdateSameVariant() {
    let store = common::seeded_store(&["en", "de"]);
    let payload = EntryPayload { name: Some("Krypto".to_string()), ..Default::default() };

    store.publish_entry("categories", common::CATEGORY_ID, "de", &payload, false).await.unwrap();
    store.publish_entry("categories", common::CATEGORY_ID, "de", &payload, false).await.unwrap();

    assert_eq!(store.variant_locales("categories", common::CATEGORY_ID), vec!["de", "en"]);
    let de = store.variant("categories", common::CATEGORY_ID, "de").unwrap();
    assert_eq!(de.name.as_deref(), Some("Krypto"));
    assert!(de.published_at.is_some());

    let en = store
        .get_entry("categories", common::CATEGORY_ID, Some(ANY_LOCALE), None)
        .await
        .unwrap()
        .unwrap();
    assert!(en.has_locale("de"));
}

#[tokio::test]
async fn test_publishEntry_withFailingLocale_shouldReturnApiError() {
    let store = common::seeded_store(&["en", "fr"]);
    store.fail_publishes_for("fr");

    let result = store
        .publish_entry("articles", common::ARTICLE_ID, "fr", &EntryPayload::default(), true)
        .await;

    assert!(matches!(result, Err(StoreError::ApiError { status_code: 400, .. })));
    assert!(store.publishes().is_empty());
}

#[tokio::test]
async fn test_insert_withoutDocumentId_shouldGenerateOne() {
    let store = MemoryStore::new(&["en"]);
    let id = store.insert("articles", Entry::default());

    assert!(!id.is_empty());
    assert!(store.get_entry("articles", &id, None, None).await.unwrap().is_some());
}

#[tokio::test]
async fn test_getAllLocales_shouldReturnConfiguredLocales() {
    let store = MemoryStore::new(&["en", "fr", "zh-Hans"]);
    assert_eq!(store.get_all_locales().await.unwrap(), vec!["en", "fr", "zh-Hans"]);
}

#[test]
fn test_endpointForContentType_shouldPluralizeContentTypes() {
    assert_eq!(endpoint_for_content_type("article"), "articles");
    assert_eq!(endpoint_for_content_type("category"), "categories");
    assert_eq!(endpoint_for_content_type("glossary"), "glossaries");
    assert_eq!(endpoint_for_content_type("news-brief"), "news-briefs");
    assert_eq!(endpoint_for_content_type("address"), "addresses");
}

#[test]
fn test_entryPayload_copyOf_shouldCarryReferences() {
    let payload = EntryPayload::copy_of(&common::sample_article());
    assert_eq!(payload.category.as_deref(), Some(common::CATEGORY_ID));
    assert_eq!(payload.tags, Some(vec!["tag-1".to_string(), "tag-2".to_string()]));
    assert_eq!(payload.cover_picture, Some(42));
    assert_eq!(payload.slug.as_deref(), Some("bitcoin-basics"));
}
