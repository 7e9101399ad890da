/*!
 * Markup handling for the translation pipeline.
 *
 * - `tags`: attribute ledger, decompose and recompose
 * - `chunker`: paragraph-aligned chunking for engine size limits
 * - `cleanup`: final cleanup before persisting
 * - `links`: optional link post-processing hooks
 */

pub use self::chunker::{chunk, DEFAULT_MAX_CHUNK_CHARS};
pub use self::cleanup::clean_for_store;
pub use self::links::{ExternalLinkStripper, KeywordLink, KeywordLinker, PostProcessor};
pub use self::tags::{
    decompose, recompose, recompose_with_report, AttributeLedger, RecomposeReport, TagRecord,
};

pub mod chunker;
pub mod cleanup;
pub mod links;
pub mod tags;
