//! Fixed-width chunking for long descriptions.

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Chunking counts `char`s, not bytes, and ignores word boundaries: a word
/// can be cut in half. Concatenating the chunks gives back `text`. An empty
/// string yields no chunks; `max_chars == 0` yields the text unsplit.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    if max_chars == 0 {
        return vec![text.to_string()];
    }

    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Keep at most `max_lines` chunks, marking the cut with `...`.
pub fn clamp_lines(mut chunks: Vec<String>, max_lines: usize, max_chars: usize) -> Vec<String> {
    if chunks.len() <= max_lines || max_lines == 0 {
        return chunks;
    }
    chunks.truncate(max_lines);
    if let Some(last) = chunks.last_mut() {
        let keep = max_chars.saturating_sub(3);
        let mut shortened: String = last.chars().take(keep).collect();
        shortened.push_str("...");
        *last = shortened;
    }
    chunks
}
