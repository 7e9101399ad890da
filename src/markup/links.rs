/*!
 * Optional link post-processing hooks.
 *
 * These run on the cleaned, translated content of an entry and are not part
 * of the decompose/translate/recompose cycle. Both are plain text
 * substitutions:
 * - `ExternalLinkStripper` unwraps anchors pointing to other sites
 * - `KeywordLinker` links the first mention of configured keywords
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use url::Url;

use super::tags::{tokenize, TagRecord, Token};

/// Anchor with an absolute http(s) href, captured as (href, inner html)
static ABSOLUTE_ANCHOR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*?href\s*=\s*"(https?://[^"]*)"[^>]*>(.*?)</a\s*>"#).unwrap()
});

/// A hook applied to translated content before it is persisted
pub trait PostProcessor: Send + Sync + Debug {
    /// Transform the content of an entry translated into `locale`
    fn process(&self, html: &str, locale: &str) -> String;
}

/// Removes anchors to foreign hosts, keeping their inner content
#[derive(Debug, Clone, Default)]
pub struct ExternalLinkStripper {
    /// Host whose links are kept, subdomains included
    site_host: Option<String>,
}

impl ExternalLinkStripper {
    pub fn new(site_host: Option<String>) -> Self {
        Self {
            site_host: site_host.map(|h| h.trim().trim_start_matches("www.").to_lowercase()),
        }
    }

    fn is_internal(&self, href: &str) -> bool {
        let Some(site) = &self.site_host else {
            return false;
        };
        let Some(host) = Url::parse(href).ok().and_then(|u| u.host_str().map(str::to_lowercase)) else {
            return false;
        };
        let host = host.trim_start_matches("www.");
        host == site || host.ends_with(&format!(".{}", site))
    }
}

impl PostProcessor for ExternalLinkStripper {
    fn process(&self, html: &str, _locale: &str) -> String {
        strip_external_links(html, self)
    }
}

/// Unwrap every absolute anchor that does not point to the configured site
pub fn strip_external_links(html: &str, stripper: &ExternalLinkStripper) -> String {
    ABSOLUTE_ANCHOR_REGEX
        .replace_all(html, |caps: &regex::Captures| {
            if stripper.is_internal(&caps[1]) {
                caps[0].to_string()
            } else {
                caps[2].to_string()
            }
        })
        .into_owned()
}

/// A keyword that should link to a page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeywordLink {
    /// Text to look for
    pub keyword: String,
    /// Link target
    pub url: String,
    /// Only apply to content in this locale (all locales when absent)
    #[serde(default)]
    pub locale: Option<String>,
}

/// Links the first plain-text mention of each keyword
#[derive(Debug, Clone, Default)]
pub struct KeywordLinker {
    links: Vec<KeywordLink>,
}

impl KeywordLinker {
    pub fn new(links: Vec<KeywordLink>) -> Self {
        Self { links }
    }
}

impl PostProcessor for KeywordLinker {
    fn process(&self, html: &str, locale: &str) -> String {
        let applicable: Vec<&KeywordLink> = self
            .links
            .iter()
            .filter(|l| l.locale.as_deref().is_none_or(|loc| loc == locale))
            .collect();
        inject_keyword_links(html, &applicable)
    }
}

fn keyword_pattern(keyword: &str) -> Option<Regex> {
    let first = keyword.chars().next()?;
    let last = keyword.chars().last()?;
    let prefix = if first.is_ascii_alphanumeric() { r"\b" } else { "" };
    let suffix = if last.is_ascii_alphanumeric() { r"\b" } else { "" };
    Regex::new(&format!("{}{}{}", prefix, regex::escape(keyword), suffix)).ok()
}

/// Wrap the first mention of each keyword found outside existing anchors.
///
/// Tag contents and text inside `<a>` elements are never touched. Each
/// keyword is linked at most once per document.
pub fn inject_keyword_links(html: &str, links: &[&KeywordLink]) -> String {
    let mut pending: Vec<(Regex, &KeywordLink)> = links
        .iter()
        .filter_map(|l| keyword_pattern(&l.keyword).map(|re| (re, *l)))
        .collect();
    if pending.is_empty() {
        return html.to_string();
    }

    let mut output = String::with_capacity(html.len());
    let mut anchor_depth = 0usize;

    for token in tokenize(html) {
        match token {
            Token::Tag(tag) => {
                if let Some(record) = TagRecord::parse(tag) {
                    if record.name.eq_ignore_ascii_case("a") && !record.self_closing {
                        if record.closing {
                            anchor_depth = anchor_depth.saturating_sub(1);
                        } else {
                            anchor_depth += 1;
                        }
                    }
                }
                output.push_str(tag);
            }
            Token::Text(text) if anchor_depth == 0 && !pending.is_empty() => {
                let mut text = text.to_string();
                pending.retain(|(re, link)| {
                    let Some(m) = re.find(&text) else {
                        return true;
                    };
                    let range = m.range();
                    let linked = format!("<a href=\"{}\">{}</a>", link.url, m.as_str());
                    text.replace_range(range, &linked);
                    false
                });
                output.push_str(&text);
            }
            Token::Text(text) => output.push_str(text),
        }
    }

    output
}
