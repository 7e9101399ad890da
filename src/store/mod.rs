/*!
 * Content store interface and entry model.
 *
 * The pipeline reads and writes entries only through the `ContentStore`
 * trait. Two adapters are provided:
 * - `strapi`: REST client for a Strapi v5 instance
 * - `memory`: in-memory store for tests and dry runs
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::StoreError;

/// Locale value asking the store for whichever variant it has
pub const ANY_LOCALE: &str = "*";

/// Populate value asking the store to resolve every relation
pub const POPULATE_ALL: &str = "*";

/// Reference to another document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRef {
    /// Document identifier of the referenced entry
    pub document_id: String,
    /// Locale of the referenced variant, when populated
    #[serde(default)]
    pub locale: Option<String>,
}

impl EntryRef {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self { document_id: document_id.into(), locale: None }
    }
}

/// Reference to a media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub id: u64,
}

/// A sibling locale variant of an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Localization {
    pub locale: String,
    #[serde(default)]
    pub document_id: Option<String>,
}

/// A content-store record in one locale
///
/// Articles use `title`, `content`, `slug`, `category`, `tags` and
/// `cover_picture`; categories and tags use `name`, `description` and `slug`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Numeric row id
    #[serde(default)]
    pub id: Option<u64>,
    /// Document identifier shared by all locale variants
    pub document_id: String,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Rich HTML body
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<EntryRef>,
    #[serde(default)]
    pub tags: Option<Vec<EntryRef>>,
    #[serde(default)]
    pub cover_picture: Option<MediaRef>,
    /// Other locale variants of the same document
    #[serde(default)]
    pub localizations: Option<Vec<Localization>>,
    /// Set when the variant is published
    #[serde(default)]
    pub published_at: Option<String>,
}

impl Entry {
    /// Document ids of the referenced tags, in order
    pub fn tag_ids(&self) -> Vec<String> {
        self.tags
            .iter()
            .flatten()
            .map(|t| t.document_id.clone())
            .collect()
    }

    /// Locales this document already exists in, this variant included
    pub fn existing_locales(&self) -> Vec<String> {
        let mut locales: Vec<String> = self
            .localizations
            .iter()
            .flatten()
            .map(|l| l.locale.clone())
            .collect();
        if let Some(own) = &self.locale {
            if !locales.contains(own) {
                locales.push(own.clone());
            }
        }
        locales
    }

    /// Whether the document has a variant in `locale`
    pub fn has_locale(&self, locale: &str) -> bool {
        self.existing_locales()
            .iter()
            .any(|l| crate::language_utils::locale_codes_match(l, locale))
    }
}

/// Write model for `publish_entry`; unset fields are left out
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Category document id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Tag document ids
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Cover media id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_picture: Option<u64>,
}

impl EntryPayload {
    /// Payload copying every writable field of `entry` unchanged
    pub fn copy_of(entry: &Entry) -> Self {
        Self {
            slug: entry.slug.clone(),
            title: entry.title.clone(),
            content: entry.content.clone(),
            name: entry.name.clone(),
            description: entry.description.clone(),
            category: entry.category.as_ref().map(|c| c.document_id.clone()),
            tags: entry.tags.as_ref().map(|_| entry.tag_ids()),
            cover_picture: entry.cover_picture.map(|c| c.id),
        }
    }
}

/// What the store reports back after a write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Title of the written variant, when the type has one
    pub title: Option<String>,
}

/// Operations the pipeline needs from a content store
#[async_trait]
pub trait ContentStore: Send + Sync + Debug {
    /// Fetch a document in one locale, drafts included
    ///
    /// # Arguments
    /// * `type_id` - Plural API name of the content type, e.g. "articles"
    /// * `id` - Document identifier
    /// * `locale` - Locale to read, `ANY_LOCALE` for any variant, `None` for the store default
    /// * `populate` - Relations to resolve, `POPULATE_ALL` for all
    ///
    /// # Returns
    /// * `Ok(None)` if the document or variant does not exist
    async fn get_entry(
        &self,
        type_id: &str,
        id: &str,
        locale: Option<&str>,
        populate: Option<&str>,
    ) -> Result<Option<Entry>, StoreError>;

    /// Fetch the first document whose slug matches, drafts included
    async fn get_entry_by_slug(
        &self,
        type_id: &str,
        slug: &str,
        locale: Option<&str>,
        populate: Option<&str>,
    ) -> Result<Option<Entry>, StoreError>;

    /// Create or update the `locale` variant of a document
    ///
    /// `draft` keeps the variant unpublished.
    async fn publish_entry(
        &self,
        type_id: &str,
        id: &str,
        locale: &str,
        payload: &EntryPayload,
        draft: bool,
    ) -> Result<PublishOutcome, StoreError>;

    /// All locale codes configured in the store
    async fn get_all_locales(&self) -> Result<Vec<String>, StoreError>;
}

/// API endpoint name for a singular content-type name
///
/// The store exposes collection types under their English plural
/// (`article` -> `articles`, `category` -> `categories`).
pub fn endpoint_for_content_type(singular: &str) -> String {
    let singular = singular.trim();
    let irregular = match singular {
        "category" => Some("categories"),
        "child" => Some("children"),
        "person" => Some("people"),
        "man" => Some("men"),
        "woman" => Some("women"),
        "analysis" => Some("analyses"),
        "thesis" => Some("theses"),
        "crisis" => Some("crises"),
        "leaf" => Some("leaves"),
        "potato" => Some("potatoes"),
        "tomato" => Some("tomatoes"),
        _ => None,
    };
    if let Some(plural) = irregular {
        return plural.to_string();
    }

    let vowel_y = ["ay", "ey", "iy", "oy", "uy"].iter().any(|e| singular.ends_with(e));
    if singular.ends_with('y') && !vowel_y {
        format!("{}ies", &singular[..singular.len() - 1])
    } else if ["s", "x", "z", "ch", "sh"].iter().any(|e| singular.ends_with(e)) {
        format!("{}es", singular)
    } else if let Some(stem) = singular.strip_suffix("fe") {
        format!("{}ves", stem)
    } else if let Some(stem) = singular.strip_suffix('f') {
        format!("{}ves", stem)
    } else {
        format!("{}s", singular)
    }
}

pub mod memory;
pub mod strapi;
