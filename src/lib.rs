/*!
 * # polypress - HTML-preserving translation of content-store entries
 *
 * A Rust library that translates articles, categories and tags stored in a
 * multi-locale content store into every other configured locale, without
 * losing the markup attributes the translation engine would drop or mangle.
 *
 * ## Features
 *
 * - Strip attributes before translation and restore them afterwards
 * - Paragraph-aligned chunking for engine size limits
 * - Concurrent, order-preserving chunk translation with per-chunk fallback
 * - Idempotent localization of referenced categories and tags
 * - Concurrent per-locale jobs that fail independently
 * - Strapi v5 content store and DeepL engine clients
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `markup`: Markup handling:
 *   - `markup::tags`: Attribute ledger, decompose and recompose
 *   - `markup::chunker`: Paragraph-aligned chunking
 *   - `markup::cleanup`: Cleanup before persisting
 *   - `markup::links`: Optional link post-processing
 * - `translation`: The translation pipeline:
 *   - `translation::gateway`: Chunked engine front end
 *   - `translation::cache`: Caching of translated chunks
 *   - `translation::dependencies`: Category and tag localization
 *   - `translation::orchestrator`: Per-entry, per-locale orchestration
 * - `store`: Content store interface and adapters:
 *   - `store::strapi`: Strapi REST client
 *   - `store::memory`: In-memory store
 * - `providers`: Translation engine interface and clients:
 *   - `providers::deepl`: DeepL API client
 *   - `providers::mock`: Deterministic mock engine
 * - `app_controller`: Main application controller
 * - `language_utils`: Locale code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod language_utils;
pub mod markup;
pub mod providers;
pub mod store;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, EntryTarget};
pub use errors::{AppError, PipelineError, ProviderError, StoreError};
pub use language_utils::{get_language_name, locale_codes_match, to_engine_code};
pub use markup::{chunk, clean_for_store, decompose, recompose};
pub use store::{ContentStore, Entry, EntryPayload};
pub use translation::{Orchestrator, TranslationGateway, TranslationSummary};
