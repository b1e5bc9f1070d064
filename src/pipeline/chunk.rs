//! Sentence-aligned chunking of long documents.
//!
//! Small local models have short context windows. When a chunk size is
//! configured the controller splits the extracted text here and sends the
//! pieces one after another, joining the completions afterwards.

/// Separator placed between per-chunk summaries. The exporter turns each
/// part into its own "Section N" heading.
pub const SECTION_BREAK: &str = "\n\n--- SECTION BREAK ---\n\n";

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Line breaks are flattened to spaces and the text is split on `". "`;
/// every sentence in the output ends with exactly one period.
/// Sentences are packed greedily; a single sentence longer than the limit
/// is split on spaces instead. A lone word longer than the limit becomes
/// its own chunk. Empty input yields no chunks.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let flat = text.replace(['\n', '\r'], " ");

    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in flat.split(". ").map(str::trim).filter(|s| !s.is_empty()) {
        let sentence = sentence.strip_suffix('.').unwrap_or(sentence);
        let piece = format!("{sentence}. ");

        if char_len(&current) + char_len(&piece) <= max_chars {
            current.push_str(&piece);
            continue;
        }

        flush(&mut chunks, &mut current);

        if char_len(&piece) <= max_chars {
            current = piece;
        } else {
            for word in piece.split(' ').filter(|w| !w.is_empty()) {
                if char_len(&current) + char_len(word) + 1 > max_chars {
                    flush(&mut chunks, &mut current);
                }
                current.push_str(word);
                current.push(' ');
            }
            flush(&mut chunks, &mut current);
        }
    }
    flush(&mut chunks, &mut current);
    chunks
}

fn flush(chunks: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
    current.clear();
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = chunk_text("Cells divide. Cells grow.", 100);
        assert_eq!(chunks, vec!["Cells divide. Cells grow."]);
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(chunk_text("", 100).is_empty());
        assert!(chunk_text("  \n ", 100).is_empty());
    }

    #[test]
    fn packs_sentences_without_exceeding_limit() {
        let text = "Alpha beta gamma. Delta epsilon zeta. Eta theta iota. Kappa lambda mu.";
        let chunks = chunk_text(text, 40);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.chars().count() <= 40, "{c:?} too long");
        }
        assert!(chunks[0].starts_with("Alpha beta gamma."));
    }

    #[test]
    fn sentence_sized_input_never_exceeds_limit() {
        let sentence = "The mitochondria is the powerhouse of the cell";
        let text = vec![sentence; 50].join(". ");
        for c in chunk_text(&text, 120) {
            assert!(c.chars().count() <= 120);
        }
    }

    #[test]
    fn long_sentence_splits_on_words() {
        let text = "word ".repeat(60);
        let chunks = chunk_text(&text, 50);
        assert!(chunks.len() >= 5);
        for c in &chunks {
            assert!(c.chars().count() <= 50);
            assert!(c.starts_with("word"));
        }
    }

    #[test]
    fn newlines_are_flattened() {
        let chunks = chunk_text("First line\nsecond line. Next", 100);
        assert_eq!(chunks, vec!["First line second line. Next."]);
    }
}
