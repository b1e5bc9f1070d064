//! Cheap title detection for the start of a document.

/// Topic used when the text offers nothing better.
pub const FALLBACK_TOPIC: &str = "PDF Content Summary";

/// How much of the document is inspected.
const SNIPPET_CHARS: usize = 1000;

/// Guess a topic from the opening of `text`.
///
/// Looks at the first three sentences of the first 1000 characters and
/// returns the first one with 3–10 words of which more than half are
/// capitalised alphabetic words (`Cell`, `DNA`), minus a trailing period.
/// Otherwise the first sentence is returned, or [`FALLBACK_TOPIC`] for
/// blank text.
pub fn extract_topic(text: &str) -> String {
    let snippet: String = text.chars().take(SNIPPET_CHARS).collect();
    let sentences: Vec<&str> = snippet
        .split(". ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    for sentence in sentences.iter().take(3) {
        let words: Vec<&str> = sentence.split_whitespace().collect();
        if (3..=10).contains(&words.len()) {
            let capitalised = words.iter().filter(|w| is_capitalised(w)).count();
            if capitalised * 2 > words.len() {
                return sentence.trim_end_matches('.').to_string();
            }
        }
    }

    sentences
        .first()
        .map(|s| s.to_string())
        .unwrap_or_else(|| FALLBACK_TOPIC.to_string())
}

/// Alphabetic and either all upper case or title case.
fn is_capitalised(word: &str) -> bool {
    if word.is_empty() || !word.chars().all(char::is_alphabetic) {
        return false;
    }
    let all_upper = word.chars().all(char::is_uppercase);
    let mut chars = word.chars();
    let title = chars.next().is_some_and(char::is_uppercase) && chars.all(char::is_lowercase);
    all_upper || title
}
