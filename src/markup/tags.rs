/*!
 * Attribute-preserving tag decomposition.
 *
 * Translation engines handle bare tags well but tend to mangle, translate or
 * drop attribute values. `decompose` strips every tag down to its bare form
 * and records the attributes in an ordered ledger; `recompose` walks the
 * translated skeleton and puts the attributes back on every tag that still
 * lines up with the ledger.
 *
 * Matching is positional: the recomposer keeps a cursor into the ledger and
 * only consumes an entry when the next tag in the translated text has the
 * same name and closing flag. Tags the engine inserted, dropped or reordered
 * are emitted as they are, without attributes, and the cursor waits until a
 * later tag lines up again.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Any `<...>` run, the unit the tokenizer splits on
static TAG_TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[^>]+>").unwrap()
});

/// Parts of a tag token: closing slash, name, rest
static TAG_PARTS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<\s*(/?)([^\s/>]+)([^>]*)>$").unwrap()
});

/// A piece of markup produced by the tokenizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// A `<...>` run that parses as a tag
    Tag(&'a str),
    /// Everything else, including `<...>` runs that are not tags
    Text(&'a str),
}

impl<'a> Token<'a> {
    /// The source text of the token
    pub fn as_str(&self) -> &'a str {
        match self {
            Token::Tag(s) | Token::Text(s) => s,
        }
    }
}

/// Split markup into alternating text and tag tokens.
///
/// Concatenating the tokens gives back the input.
pub fn tokenize(html: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for m in TAG_TOKEN_REGEX.find_iter(html) {
        if m.start() > last {
            tokens.push(Token::Text(&html[last..m.start()]));
        }
        if TAG_PARTS_REGEX.is_match(m.as_str()) {
            tokens.push(Token::Tag(m.as_str()));
        } else {
            tokens.push(Token::Text(m.as_str()));
        }
        last = m.end();
    }

    if last < html.len() {
        tokens.push(Token::Text(&html[last..]));
    }

    tokens
}

/// One ledger record: everything `decompose` removed from a tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    /// Whether this is a closing tag (`</p>`)
    pub closing: bool,
    /// Tag name as written in the source
    pub name: String,
    /// Raw attribute text, trimmed, without the self-closing slash
    pub attributes: String,
    /// Whether the tag ended with `/>`
    pub self_closing: bool,
    /// The tag exactly as it appeared in the source
    source: String,
}

impl TagRecord {
    /// Parse a tag token, `None` if it is not a tag
    pub fn parse(token: &str) -> Option<Self> {
        let caps = TAG_PARTS_REGEX.captures(token)?;
        let closing = !caps[1].is_empty();
        let name = caps[2].to_string();

        let mut attributes = caps[3].trim();
        let self_closing = attributes.ends_with('/');
        if self_closing {
            attributes = attributes[..attributes.len() - 1].trim();
        }

        Some(Self {
            closing,
            name,
            attributes: attributes.to_string(),
            self_closing,
            source: token.to_string(),
        })
    }

    /// The attribute-less form sent to the engine
    pub fn bare(&self) -> String {
        let slash = if self.closing { "/" } else { "" };
        let tail = if self.self_closing { " /" } else { "" };
        format!("<{}{}{}>", slash, self.name, tail)
    }

    /// The source form of the tag, attributes included
    pub fn restored(&self) -> &str {
        &self.source
    }

    /// Whether a translated tag occupies this record's slot
    fn lines_up_with(&self, other: &TagRecord) -> bool {
        self.closing == other.closing && self.name == other.name
    }

    /// The 4-tuple view used in logs and tests
    pub fn as_tuple(&self) -> (bool, &str, &str, bool) {
        (self.closing, &self.name, &self.attributes, self.self_closing)
    }
}

/// Ordered attributes of every tag of a source document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeLedger {
    records: Vec<TagRecord>,
}

impl AttributeLedger {
    /// Number of recorded tags
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the source had no tags
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at position `index`
    pub fn get(&self, index: usize) -> Option<&TagRecord> {
        self.records.get(index)
    }

    /// Iterate the records in document order
    pub fn iter(&self) -> impl Iterator<Item = &TagRecord> {
        self.records.iter()
    }
}

/// Result of a recompose pass with desync bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecomposeReport {
    /// The recomposed markup
    pub html: String,
    /// Tags that got their attributes back
    pub restored: usize,
    /// Tags emitted without a matching ledger record
    pub unmatched: usize,
    /// Ledger records never consumed
    pub unconsumed: usize,
}

impl RecomposeReport {
    /// Whether the translated tag sequence lined up with the ledger throughout
    pub fn is_aligned(&self) -> bool {
        self.unmatched == 0 && self.unconsumed == 0
    }
}

/// Strip all attributes from `html`.
///
/// Returns the skeleton and the ledger needed to restore the attributes.
pub fn decompose(html: &str) -> (String, AttributeLedger) {
    let mut skeleton = String::with_capacity(html.len());
    let mut ledger = AttributeLedger::default();

    for token in tokenize(html) {
        match token {
            Token::Tag(tag) => match TagRecord::parse(tag) {
                Some(record) => {
                    skeleton.push_str(&record.bare());
                    ledger.records.push(record);
                }
                None => skeleton.push_str(tag),
            },
            Token::Text(text) => skeleton.push_str(text),
        }
    }

    (skeleton, ledger)
}

/// Put the ledger's attributes back into a translated skeleton.
pub fn recompose(translated: &str, ledger: &AttributeLedger) -> String {
    recompose_with_report(translated, ledger).html
}

/// Same as [`recompose`], also counting how well the tags lined up.
pub fn recompose_with_report(translated: &str, ledger: &AttributeLedger) -> RecomposeReport {
    let mut html = String::with_capacity(translated.len() + translated.len() / 4);
    let mut idx = 0;
    let mut restored = 0;
    let mut unmatched = 0;

    for token in tokenize(translated) {
        let tag = match token {
            Token::Tag(tag) => tag,
            Token::Text(text) => {
                html.push_str(text);
                continue;
            }
        };

        let parsed = TagRecord::parse(tag);
        match (parsed, ledger.get(idx)) {
            (Some(parsed), Some(expected)) if expected.lines_up_with(&parsed) => {
                html.push_str(expected.restored());
                idx += 1;
                restored += 1;
            }
            _ => {
                html.push_str(tag);
                unmatched += 1;
            }
        }
    }

    RecomposeReport {
        html,
        restored,
        unmatched,
        unconsumed: ledger.len() - idx,
    }
}
