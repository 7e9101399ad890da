/*!
 * Final cleanup of translated markup before it is written to the store.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// `class`, `id` and `data-*` attributes with their leading whitespace
static PRESENTATION_ATTR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\s+(?:class|id|data-[\w-]+)="[^"]*""#).unwrap()
});

static FIGURE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<figure\b.*?</figure>").unwrap()
});

static SVG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<svg\b.*?</svg>").unwrap()
});

static EMPTY_DIV_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<div>\s*</div>").unwrap()
});

/// Prepare translated markup for the content store.
///
/// Drops styling hooks pasted in from other sites (`class`, `id`, `data-*`;
/// inline `style` is kept), removes `<figure>` and `<svg>` blocks the store's
/// editor cannot render, removes empty `<div>` containers and merges doubled
/// `</p></p>` closings.
pub fn clean_for_store(html: &str) -> String {
    let cleaned = PRESENTATION_ATTR_REGEX.replace_all(html, "");
    let cleaned = FIGURE_REGEX.replace_all(&cleaned, "");
    let cleaned = SVG_REGEX.replace_all(&cleaned, "");
    let cleaned = EMPTY_DIV_REGEX.replace_all(&cleaned, "");
    cleaned.replace("</p></p>", "</p>")
}
