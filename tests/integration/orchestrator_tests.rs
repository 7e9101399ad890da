/*!
 * End-to-end tests for entry, dependency and locale orchestration
 */

use std::sync::Arc;
use parking_lot::Mutex;

use polypress::errors::PipelineError;
use polypress::markup::KeywordLink;
use polypress::providers::mock::MockEngine;
use polypress::store::memory::MemoryStore;
use polypress::store::ContentStore;
use polypress::translation::{DependencyKind, Orchestrator, ProgressCallback};
use crate::common;

#[tokio::test]
async fn test_translateContent_withAllLocales_shouldStoreDraftsAndDependencies() {
    common::init_logger();
    let store = Arc::new(common::seeded_store(&["en", "fr", "de"]));
    let orchestrator = common::orchestrator(store.clone(), MockEngine::working());

    let summary = orchestrator
        .translate_content(common::ARTICLE_ID, "articles", None, None)
        .await
        .unwrap();

    assert!(summary.success);
    assert_eq!(summary.message, "Translated 2/2 locale(s)");
    let locales: Vec<&str> = summary.results.iter().map(|r| r.locale.as_str()).collect();
    assert_eq!(locales, vec!["fr", "de"]);
    assert_eq!(summary.results[0].title.as_deref(), Some("[fr] Bitcoin Basics"));

    let fr = store.variant("articles", common::ARTICLE_ID, "fr").unwrap();
    assert_eq!(fr.title.as_deref(), Some("[fr] Bitcoin Basics"));
    assert_eq!(fr.slug.as_deref(), Some("bitcoin-basics"));
    assert!(fr.published_at.is_none());
    let content = fr.content.unwrap();
    assert!(content.starts_with("<p>[fr] Buy <b>[fr] BTC</b>"));
    assert!(content.contains(r#"<a href="https://example.com/x">[fr] it</a>"#));
    assert!(!content.contains("class="));
    assert!(!content.contains("<h1>"));
    assert_eq!(fr.category.map(|c| c.document_id), Some(common::CATEGORY_ID.to_string()));
    assert_eq!(fr.cover_picture.map(|c| c.id), Some(42));

    let category = store.variant("categories", common::CATEGORY_ID, "de").unwrap();
    assert_eq!(category.name.as_deref(), Some("[de] Crypto"));
    assert_eq!(category.description.as_deref(), Some("[de] All about Crypto"));
    assert_eq!(category.slug.as_deref(), Some("crypto"));
    assert!(category.published_at.is_some());

    assert_eq!(summary.dependencies.len(), 3);
    assert_eq!(summary.dependencies[0].kind, DependencyKind::Category);
    assert!(summary.dependencies.iter().all(|d| d.is_complete() && d.created == vec!["fr", "de"]));
}

#[tokio::test]
async fn test_translateContent_twice_shouldSkipExistingDependencies() {
    let store = Arc::new(common::seeded_store(&["en", "fr", "de"]));
    let orchestrator = common::orchestrator(store.clone(), MockEngine::working());

    orchestrator.translate_content(common::ARTICLE_ID, "articles", None, None).await.unwrap();
    let second = orchestrator.translate_content(common::ARTICLE_ID, "articles", None, None).await.unwrap();

    assert!(second.success);
    assert!(second.dependencies.iter().all(|d| d.created.is_empty() && d.skipped == vec!["fr", "de"]));
    assert_eq!(store.publishes_for("categories", common::CATEGORY_ID).len(), 2);
    assert_eq!(store.publishes_for("articles", common::ARTICLE_ID).len(), 4);
    assert_eq!(store.variant_locales("categories", common::CATEGORY_ID), vec!["de", "en", "fr"]);
}

#[tokio::test]
async fn test_translateContent_concurrently_shouldCreateOneVariantPerLocale() {
    let store = Arc::new(common::seeded_store(&["en", "fr", "de", "es"]).with_latency(5));
    let orchestrator = common::orchestrator(store.clone(), MockEngine::slow(3));

    let (first, second) = tokio::join!(
        orchestrator.translate_content(common::ARTICLE_ID, "articles", None, None),
        orchestrator.translate_content(common::ARTICLE_ID, "articles", None, None),
    );

    assert!(first.unwrap().success);
    assert!(second.unwrap().success);
    for document_id in [common::CATEGORY_ID, common::TAG_IDS[0], common::TAG_IDS[1]] {
        let endpoint = if document_id == common::CATEGORY_ID { "categories" } else { "tags" };
        assert_eq!(store.publishes_for(endpoint, document_id).len(), 3, "{} written more than once per locale", document_id);
    }
}

#[tokio::test]
async fn test_translateContent_withFailingLocale_shouldIsolateFailure() {
    let store = Arc::new(common::seeded_store(&["en", "fr", "de"]));
    store.fail_publishes_for("de");
    let orchestrator = common::orchestrator(store.clone(), MockEngine::working());

    let summary = orchestrator
        .translate_content(common::ARTICLE_ID, "articles", None, None)
        .await
        .unwrap();

    assert!(!summary.success);
    assert_eq!(summary.failed_locales(), vec!["de"]);
    assert_eq!(summary.message, "Translated 1/2 locale(s)");
    assert!(summary.results[1].error.is_some());
    assert!(store.variant("articles", common::ARTICLE_ID, "fr").is_some());
    assert!(store.variant("articles", common::ARTICLE_ID, "de").is_none());

    let category = &summary.dependencies[0];
    assert_eq!(category.created, vec!["fr"]);
    assert_eq!(category.failed.len(), 1);
    assert_eq!(category.failed[0].0, "de");
}

#[tokio::test]
async fn test_translateContent_withMissingCategory_shouldSkipIt() {
    let store = MemoryStore::new(&["en", "fr"]);
    store.insert("articles", common::sample_article());
    store.insert("tags", common::sample_taxonomy(common::TAG_IDS[0], "Bitcoin"));
    let store = Arc::new(store);
    let orchestrator = common::orchestrator(store.clone(), MockEngine::working());

    let summary = orchestrator
        .translate_content(common::ARTICLE_ID, "articles", None, None)
        .await
        .unwrap();

    assert!(summary.success);
    let found: Vec<bool> = summary.dependencies.iter().map(|d| d.found).collect();
    assert_eq!(found, vec![false, true, false]);
    assert!(store.publishes_for("categories", common::CATEGORY_ID).is_empty());
    assert!(store.variant("tags", common::TAG_IDS[0], "fr").is_some());
}

#[tokio::test]
async fn test_translateContent_withUnknownEntry_shouldReturnNotFound() {
    let store = Arc::new(common::seeded_store(&["en", "fr"]));
    let orchestrator = common::orchestrator(store.clone(), MockEngine::working());

    let err = orchestrator
        .translate_content("missing", "articles", None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::NotFound { ref entry_id, .. } if entry_id == "missing"));
    assert!(store.publishes().is_empty());
}

#[tokio::test]
async fn test_translateContent_withCanonicalTarget_shouldDoNothing() {
    let store = Arc::new(common::seeded_store(&["en", "fr"]));
    let engine = MockEngine::working();
    let orchestrator = common::orchestrator(store.clone(), engine.clone());

    let summary = orchestrator
        .translate_content(common::ARTICLE_ID, "articles", Some("en"), None)
        .await
        .unwrap();

    assert!(summary.success);
    assert_eq!(summary.message, "No target locales");
    assert!(summary.results.is_empty());
    assert!(store.publishes().is_empty());
    assert_eq!(engine.request_count(), 0);
}

#[tokio::test]
async fn test_translateContentBySlug_withSingleLocale_shouldOnlyTranslateThatLocale() {
    let store = Arc::new(common::seeded_store(&["en", "fr", "de"]));
    let engine = MockEngine::working();
    let orchestrator = common::orchestrator(store.clone(), engine.clone());

    let summary = orchestrator
        .translate_content_by_slug("bitcoin-basics", "articles", Some("fr"), None)
        .await
        .unwrap();

    assert!(summary.success);
    assert_eq!(summary.results.len(), 1);
    assert!(store.variant("articles", common::ARTICLE_ID, "fr").is_some());
    assert!(store.variant("articles", common::ARTICLE_ID, "de").is_none());
    assert!(engine.requests_for("de").is_empty());

    let missing = orchestrator
        .translate_content_by_slug("nope", "articles", None, None)
        .await;
    assert!(matches!(missing, Err(PipelineError::NotFound { .. })));
}

#[tokio::test]
async fn test_translateContent_withProgressCallback_shouldReportEachLocale() {
    let store = Arc::new(common::seeded_store(&["en", "fr", "de", "it"]));
    let orchestrator = common::orchestrator(store, MockEngine::working());
    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorder = calls.clone();
    let progress: ProgressCallback = Arc::new(move |done, total| recorder.lock().push((done, total)));

    orchestrator
        .translate_content(common::ARTICLE_ID, "articles", None, Some(progress))
        .await
        .unwrap();

    let mut calls = calls.lock().clone();
    calls.sort();
    assert_eq!(calls, vec![(1, 3), (2, 3), (3, 3)]);
}

#[tokio::test]
async fn test_translateContent_withLostHeading_shouldFailLocale() {
    fn drop_heading(text: &str, _locale: &str) -> String {
        text.replace("</h1>", "")
    }

    let store = Arc::new(common::seeded_store(&["en", "fr"]));
    let engine = MockEngine::working().with_custom_response(drop_heading);
    let orchestrator = common::orchestrator(store.clone(), engine);

    let summary = orchestrator
        .translate_content(common::ARTICLE_ID, "articles", None, None)
        .await
        .unwrap();

    assert!(!summary.success);
    assert!(summary.results[0].error.as_deref().unwrap_or_default().contains("</h1>"));
    assert!(store.publishes_for("articles", common::ARTICLE_ID).is_empty());
}

#[tokio::test]
async fn test_translateContent_withFailingEngine_shouldStoreSourceText() {
    let store = Arc::new(common::seeded_store(&["en", "fr"]));
    let orchestrator = common::orchestrator(store.clone(), MockEngine::failing());

    let summary = orchestrator
        .translate_content(common::ARTICLE_ID, "articles", None, None)
        .await
        .unwrap();

    assert!(summary.success);
    let fr = store.variant("articles", common::ARTICLE_ID, "fr").unwrap();
    assert_eq!(fr.title.as_deref(), Some("Bitcoin Basics"));
    assert!(fr.content.unwrap().contains("Buy <b>BTC</b> now."));
}

#[tokio::test]
async fn test_translateContent_withFailingEngine_shouldRetryDependenciesLater() {
    let store = Arc::new(common::seeded_store(&["en", "fr"]));

    let failed_run = common::orchestrator(store.clone(), MockEngine::failing())
        .translate_content(common::ARTICLE_ID, "articles", None, None)
        .await
        .unwrap();

    let category = &failed_run.dependencies[0];
    assert!(category.created.is_empty());
    assert_eq!(category.failed.len(), 1);
    assert_eq!(category.failed[0].0, "fr");
    assert!(store.variant("categories", common::CATEGORY_ID, "fr").is_none());
    assert!(store.publishes_for("categories", common::CATEGORY_ID).is_empty());

    let retry = common::orchestrator(store.clone(), MockEngine::working())
        .translate_content(common::ARTICLE_ID, "articles", None, None)
        .await
        .unwrap();

    assert_eq!(retry.dependencies[0].created, vec!["fr"]);
    let fr = store.variant("categories", common::CATEGORY_ID, "fr").unwrap();
    assert_eq!(fr.name.as_deref(), Some("[fr] Crypto"));
    assert_eq!(fr.description.as_deref(), Some("[fr] All about Crypto"));
}

#[tokio::test]
async fn test_fromConfig_withPostProcessing_shouldApplyHooks() {
    let mut config = common::complete_config();
    config.post_processing.strip_external_links = true;
    config.post_processing.site_host = Some("mysite.com".to_string());
    config.post_processing.keyword_links = vec![KeywordLink {
        keyword: "Hold".to_string(),
        url: "https://mysite.com/hold".to_string(),
        locale: Some("fr".to_string()),
    }];

    let store = Arc::new(common::seeded_store(&["en", "fr", "de"]));
    let orchestrator = Orchestrator::from_config(&config, store.clone(), Arc::new(MockEngine::working())).unwrap();

    orchestrator.translate_content(common::ARTICLE_ID, "articles", None, None).await.unwrap();

    let fr = store.variant("articles", common::ARTICLE_ID, "fr").unwrap().content.unwrap();
    assert!(!fr.contains("example.com"));
    assert!(fr.contains(r#"<a href="https://mysite.com/hold">Hold</a>"#));

    let de = store.variant("articles", common::ARTICLE_ID, "de").unwrap().content.unwrap();
    assert!(!de.contains("<a "));
}

#[test]
fn test_fromConfig_withInvalidPipeline_shouldFailBeforeAnyCall() {
    let mut config = common::complete_config();
    config.pipeline.concurrent_chunk_requests = 0;
    let store = Arc::new(common::seeded_store(&["en"]));

    let result = Orchestrator::from_config(&config, store.clone(), Arc::new(MockEngine::working()));

    assert!(matches!(result, Err(PipelineError::Configuration(_))));
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn test_seedLocaleDrafts_shouldCopyIntoMissingLocalesOnce() {
    let store = Arc::new(common::seeded_store(&["en", "fr", "de"]));
    let orchestrator = common::orchestrator(store.clone(), MockEngine::working());

    let results = orchestrator.seed_locale_drafts(common::ARTICLE_ID, "articles").await.unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.success));
    let publishes = store.publishes_for("articles", common::ARTICLE_ID);
    assert!(publishes.iter().all(|p| p.draft));
    assert_eq!(publishes[0].payload.title.as_deref(), Some("Bitcoin Basics"));

    let again = orchestrator.seed_locale_drafts(common::ARTICLE_ID, "articles").await.unwrap();
    assert!(again.is_empty());
    assert_eq!(store.get_all_locales().await.unwrap().len(), 3);
}
