/*!
 * Translation pipeline.
 *
 * This module drives content through the translation engine. It is split into
 * several submodules:
 *
 * - `gateway`: chunked, order-preserving engine front end
 * - `cache`: caching of translated chunks
 * - `dependencies`: localization of referenced categories and tags
 * - `orchestrator`: per-entry, per-locale job orchestration
 */

// Re-export main types for easier usage
pub use self::cache::{CacheStats, ChunkCache};
pub use self::dependencies::{DependencyKind, DependencyOutcome, DependencyResolver};
pub use self::gateway::{GatewayReport, TranslationGateway};
pub use self::orchestrator::{
    LocaleResult, Orchestrator, ProgressCallback, TranslationJob, TranslationSummary,
};

// Submodules
pub mod cache;
pub mod dependencies;
pub mod gateway;
pub mod orchestrator;
