/*!
 * Paragraph-aligned chunking of markup.
 *
 * Engines cap the size of a single request, so long documents are cut into
 * chunks. Cuts only happen right after a `</p>`, which keeps every paragraph
 * whole and lets each chunk be translated on its own. Joining the chunks in
 * order with no separator gives back the input exactly.
 */

/// Paragraph terminator used as the only cut point
pub const PARAGRAPH_END: &str = "</p>";

/// Default character budget per chunk
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 30_000;

/// Split `html` into chunks of at most `max_chars` characters.
///
/// A single paragraph longer than `max_chars` is kept whole and becomes an
/// oversized chunk of its own. An empty input yields no chunks.
pub fn chunk(html: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut buffer_chars = 0;

    for fragment in html.split_inclusive(PARAGRAPH_END) {
        let fragment_chars = fragment.chars().count();

        if !buffer.is_empty() && buffer_chars + fragment_chars > max_chars {
            chunks.push(std::mem::take(&mut buffer));
            buffer_chars = 0;
        }

        buffer.push_str(fragment);
        buffer_chars += fragment_chars;
    }

    if !buffer.is_empty() {
        chunks.push(buffer);
    }

    chunks
}
