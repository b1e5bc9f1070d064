//! Post-processing: deterministic cleanup of raw model completions.
//!
//! Small local models drift from their instructions in predictable ways:
//! they wrap plain text in ` ``` ` fences, leak `<think>` reasoning blocks,
//! emit Windows line endings or sprinkle zero-width characters copied from
//! the source PDF. The rules below undo those quirks without touching the
//! wording, so the stored note is exactly what the model meant to say.
//!
//! ## Rule Order
//!
//! Reasoning blocks go first because they may themselves contain fences.
//! Line endings are normalised before any per-line rule runs.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to a raw completion.
///
/// Rules (applied in order):
/// 1. Drop `<think>…</think>` reasoning blocks
/// 2. Strip outer code fences
/// 3. Normalise line endings (CRLF → LF)
/// 4. Trim trailing whitespace per line
/// 5. Collapse 3+ consecutive blank lines down to one
/// 6. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 7. Trim leading and trailing blank space
///
/// The result may be empty; callers decide whether that is an error.
pub fn clean_completion(input: &str) -> String {
    let s = strip_think_blocks(input);
    let s = strip_outer_fences(&s);
    let s = normalise_line_endings(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = remove_invisible_chars(&s);
    s.trim().to_string()
}

// ── Rule 1: Drop reasoning blocks ───────────────────────────────────────────

static RE_THINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid think regex"));

fn strip_think_blocks(input: &str) -> String {
    RE_THINK.replace_all(input, "").to_string()
}

// ── Rule 2: Strip outer fences ──────────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```(?:[A-Za-z]+)?\r?\n(.*)\r?\n```\s*$").expect("valid fence regex")
});

fn strip_outer_fences(input: &str) -> String {
    match RE_OUTER_FENCES.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

// ── Rule 3: Normalise line endings ──────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 4: Trim trailing whitespace per line ───────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 5: Collapse excessive blank lines ──────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("valid blank-line regex"));

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

// ── Rule 6: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fences_with_and_without_language() {
        assert_eq!(strip_outer_fences("```text\nHello\nWorld\n```"), "Hello\nWorld");
        assert_eq!(strip_outer_fences("```\nHello\n```"), "Hello");
        assert_eq!(strip_outer_fences("Hello"), "Hello");
    }

    #[test]
    fn inner_fences_are_kept() {
        let input = "Intro\n```\ncode\n```\nOutro";
        assert_eq!(strip_outer_fences(input), input);
    }

    #[test]
    fn drops_think_blocks() {
        let input = "<think>\nlet me reason\n</think>\nThe answer is 42.";
        assert_eq!(clean_completion(input), "The answer is 42.");
    }

    #[test]
    fn normalises_and_collapses() {
        let input = "a  \r\n\r\n\r\n\r\nb\rc";
        assert_eq!(clean_completion(input), "a\n\nb\nc");
    }

    #[test]
    fn removes_invisible() {
        assert_eq!(
            remove_invisible_chars("cell\u{200B}ular\u{FEFF} bio\u{00AD}logy"),
            "cellular biology"
        );
    }

    #[test]
    fn blank_output_stays_empty() {
        assert_eq!(clean_completion("  \n\n\t "), "");
        assert_eq!(clean_completion("<think>only thoughts</think>"), "");
    }

    #[test]
    fn keeps_bullets_and_section_structure() {
        let input = "• Key point\n- detail\n\nQ: Why?\nA: Because.";
        assert_eq!(clean_completion(input), input);
    }
}
