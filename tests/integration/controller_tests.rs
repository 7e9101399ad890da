/*!
 * Tests for controller wiring
 */

use std::sync::Arc;

use polypress::app_config::{Config, ENV_ENGINE_AUTH_KEY};
use polypress::providers::mock::MockEngine;
use polypress::{Controller, EntryTarget};
use crate::common;

fn controller(locales: &[&str], engine: MockEngine) -> (Controller, Arc<polypress::store::memory::MemoryStore>) {
    let store = Arc::new(common::seeded_store(locales));
    let controller = Controller::with_adapters(common::complete_config(), store.clone(), Arc::new(engine))
        .unwrap()
        .without_progress();
    (controller, store)
}

#[tokio::test]
async fn test_translate_withEntryId_shouldTranslateEveryLocale() {
    common::init_logger();
    let (controller, store) = controller(&["en", "fr", "de"], MockEngine::working());

    let summary = controller
        .translate(&EntryTarget::Id(common::ARTICLE_ID.to_string()), "articles", None)
        .await
        .unwrap();

    assert!(summary.success);
    assert_eq!(store.variant_locales("articles", common::ARTICLE_ID), vec!["de", "en", "fr"]);
}

#[tokio::test]
async fn test_translate_withSlug_shouldFindCanonicalEntry() {
    let (controller, store) = controller(&["en", "fr"], MockEngine::working());

    let summary = controller
        .translate(&EntryTarget::Slug("bitcoin-basics".to_string()), "articles", Some("fr"))
        .await
        .unwrap();

    assert_eq!(summary.results.len(), 1);
    assert!(store.variant("articles", common::ARTICLE_ID, "fr").is_some());
}

#[tokio::test]
async fn test_translate_withUnknownEntry_shouldReturnError() {
    let (controller, _store) = controller(&["en", "fr"], MockEngine::working());

    let err = controller
        .translate(&EntryTarget::Id("missing".to_string()), "articles", None)
        .await
        .unwrap_err();

    assert!(format!("{:#}", err).contains("not found"));
}

#[tokio::test]
async fn test_locales_shouldListStoreLocales() {
    let (controller, _store) = controller(&["en", "fr", "pt-BR"], MockEngine::working());
    assert_eq!(controller.locales().await.unwrap(), vec!["en", "fr", "pt-BR"]);
}

#[tokio::test]
async fn test_seed_withFailingLocale_shouldReportPerLocale() {
    let (controller, store) = controller(&["en", "fr", "de"], MockEngine::working());
    store.fail_publishes_for("fr");

    let results = controller.seed(common::ARTICLE_ID, "articles").await.unwrap();

    assert_eq!(results.len(), 2);
    assert!(!results.iter().find(|r| r.locale == "fr").unwrap().success);
    assert!(results.iter().find(|r| r.locale == "de").unwrap().success);
}

#[test]
fn test_checkEngine_shouldReflectEngineState() {
    let (working, _) = controller(&["en"], MockEngine::working());
    assert!(tokio_test::block_on(working.check_engine()).is_ok());

    let (failing, _) = controller(&["en"], MockEngine::failing());
    let err = tokio_test::block_on(failing.check_engine()).unwrap_err();
    assert!(err.to_string().contains("Mock"));
}

#[test]
fn test_withConfig_withMissingCredentials_shouldFailBeforeConnecting() {
    let mut config = common::complete_config();
    config.engine.auth_key.clear();

    let err = Controller::with_config(config).err().expect("missing key must be rejected");

    assert!(format!("{:#}", err).contains(ENV_ENGINE_AUTH_KEY));
}

#[test]
fn test_withConfig_withCompleteConfig_shouldBuild() {
    let controller = Controller::with_config(common::complete_config()).unwrap();
    assert_eq!(controller.config().canonical_locale, "en");
    assert_eq!(controller.orchestrator().canonical_locale(), "en");
}

#[test]
fn test_withAdapters_withInvalidCanonicalLocale_shouldNotTouchStore() {
    let mut config: Config = common::complete_config();
    config.canonical_locale = "??".to_string();
    let store = Arc::new(common::seeded_store(&["en"]));

    let result = Controller::with_adapters(config, store.clone(), Arc::new(MockEngine::working()));

    assert!(result.is_err());
    assert_eq!(store.call_count(), 0);
}
