//! Prompt templates and the prompt builder.
//!
//! Every instruction sent to the model lives here so the wording can be
//! changed in one place and inspected by unit tests without a model. The
//! builder is a pure function of its inputs.

use crate::config::{AnswerLength, QuestionStyle};
use crate::error::KiriError;
use crate::note::NoteKind;

/// Instruction for [`NoteKind::Summary`].
pub const SUMMARY_PROMPT: &str = "You are an expert note-taking assistant specializing in creating structured, \
detailed summaries. Create a comprehensive summary of the provided text. \
Focus on key facts, important concepts, and critical takeaways. \
Organize information logically with clear sections and paragraphs. \
Do not use markdown or special formatting in your response.";

/// Instruction for [`NoteKind::Overview`].
pub const OVERVIEW_PROMPT: &str = "Create a concise brief overview of the following text. \
Focus on the most important concepts and key takeaways. \
Use a clear paragraph structure.";

/// Persona used for professor-mode answers.
pub const PROFESSOR_PROMPT: &str = "You are a helpful professor assistant. \
Answer questions clearly and provide detailed explanations.";

/// Default number of Q&A pairs.
pub const DEFAULT_QNA_COUNT: usize = 5;

/// Default number of practice questions.
pub const DEFAULT_PRACTICE_COUNT: usize = 10;

/// Tunables for [`build_with`].
#[derive(Debug, Clone, PartialEq)]
pub struct PromptOptions {
    /// Questions to generate; `None` uses the per-kind default.
    pub question_count: Option<usize>,
    pub question_style: QuestionStyle,
    pub answer_length: Option<AnswerLength>,
    /// Characters of context kept for professor-mode answers.
    pub context_limit: usize,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            question_count: None,
            question_style: QuestionStyle::Mixed,
            answer_length: None,
            context_limit: 5000,
        }
    }
}

/// A prompt ready to be sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub kind: NoteKind,
    /// The full prompt string.
    pub text: String,
    /// Sampling temperature suited to the kind.
    pub temperature: f32,
}

/// Build the prompt for `kind` with default options.
pub fn build(text: &str, kind: NoteKind, question: Option<&str>) -> Result<Prompt, KiriError> {
    build_with(text, kind, question, &PromptOptions::default())
}

/// Build the prompt for `kind`.
///
/// Fails with [`KiriError::InvalidInput`] when `text` is blank, or when
/// `kind` is [`NoteKind::Answer`] and no question is given. `question` is
/// ignored for every other kind.
pub fn build_with(
    text: &str,
    kind: NoteKind,
    question: Option<&str>,
    options: &PromptOptions,
) -> Result<Prompt, KiriError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(KiriError::InvalidInput(
            "no source text to send to the model".into(),
        ));
    }

    let body = match kind {
        NoteKind::Summary => with_source(SUMMARY_PROMPT, text),
        NoteKind::Overview => with_source(OVERVIEW_PROMPT, text),
        NoteKind::Qna => {
            let n = options.question_count.unwrap_or(DEFAULT_QNA_COUNT);
            with_source(&qna_instruction(n, options.question_style), text)
        }
        NoteKind::PracticeQuestions => {
            let n = options.question_count.unwrap_or(DEFAULT_PRACTICE_COUNT);
            with_source(&practice_instruction(n, options.question_style), text)
        }
        NoteKind::Answer => {
            let question = question.map(str::trim).filter(|q| !q.is_empty()).ok_or_else(|| {
                KiriError::InvalidInput("professor mode needs a question".into())
            })?;
            answer_prompt(text, question, options)
        }
    };

    Ok(Prompt {
        kind,
        text: body,
        temperature: temperature_for(kind),
    })
}

/// Sampling temperature: summaries stay close to the source, question sets
/// and answers get more room.
pub fn temperature_for(kind: NoteKind) -> f32 {
    match kind {
        NoteKind::Summary | NoteKind::Overview => 0.4,
        _ => 0.7,
    }
}

fn with_source(instruction: &str, text: &str) -> String {
    format!("{instruction}\n\nText:\n\"\"\"\n{text}\n\"\"\"")
}

fn qna_instruction(count: usize, style: QuestionStyle) -> String {
    let mut s = format!(
        "Generate {count} important questions and detailed answers based on the following text. \
Format each pair clearly as:\nQ: [Question]\nA: [Detailed answer]\n\
Separate each pair with a blank line."
    );
    if style != QuestionStyle::Mixed {
        s.push_str(&format!("\nQuestion type: {}", style.label()));
    }
    s
}

fn practice_instruction(count: usize, style: QuestionStyle) -> String {
    let mix = match style {
        QuestionStyle::Mixed => {
            "Include a mix of multiple choice, short answer, and discussion questions.".to_string()
        }
        other => format!("Include {} questions.", other.label()),
    };
    format!(
        "Create {count} practice questions based on the following text. {mix} \
Number each question clearly."
    )
}

fn answer_prompt(context: &str, question: &str, options: &PromptOptions) -> String {
    let mut s = String::new();
    if let Some(length) = options.answer_length {
        s.push_str(&format!("Answer length: {}. ", length.directive()));
    }
    s.push_str(PROFESSOR_PROMPT);
    s.push_str(&format!(
        "\n\nBased on the following text, please answer this question: {question}\nContext text:\n{}",
        truncate_context(context, options.context_limit)
    ));
    s
}

/// Keep at most `limit` characters, marking a cut with `...`.
pub fn truncate_context(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "The mitochondria is the powerhouse of the cell.";

    #[test]
    fn build_is_deterministic() {
        for kind in NoteKind::DOCUMENT_KINDS {
            assert_eq!(build(TEXT, kind, None).unwrap(), build(TEXT, kind, None).unwrap());
        }
        let a = build(TEXT, NoteKind::Answer, Some("What is it?")).unwrap();
        let b = build(TEXT, NoteKind::Answer, Some("What is it?")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn every_prompt_embeds_the_text() {
        for kind in NoteKind::DOCUMENT_KINDS {
            let p = build(TEXT, kind, None).unwrap();
            assert!(p.text.contains(TEXT), "{kind}: {}", p.text);
            assert_eq!(p.kind, kind);
        }
    }

    #[test]
    fn answer_without_question_is_invalid() {
        let err = build(TEXT, NoteKind::Answer, None).unwrap_err();
        assert!(matches!(err, KiriError::InvalidInput(_)));
        let err = build(TEXT, NoteKind::Answer, Some("   ")).unwrap_err();
        assert!(matches!(err, KiriError::InvalidInput(_)));
    }

    #[test]
    fn empty_text_is_invalid() {
        for kind in NoteKind::DOCUMENT_KINDS {
            assert!(matches!(
                build(" \n\t", kind, None),
                Err(KiriError::InvalidInput(_))
            ));
        }
        assert!(build("", NoteKind::Answer, Some("why?")).is_err());
    }

    #[test]
    fn question_counts_and_defaults() {
        let qna = build(TEXT, NoteKind::Qna, None).unwrap();
        assert!(qna.text.contains("Generate 5 important questions"));
        assert!(qna.text.contains("Q: [Question]"));

        let practice = build(TEXT, NoteKind::PracticeQuestions, None).unwrap();
        assert!(practice.text.contains("Create 10 practice questions"));
        assert!(practice.text.contains("mix of multiple choice"));

        let opts = PromptOptions {
            question_count: Some(3),
            question_style: QuestionStyle::Discussion,
            ..Default::default()
        };
        let custom = build_with(TEXT, NoteKind::PracticeQuestions, None, &opts).unwrap();
        assert!(custom.text.contains("Create 3 practice questions"));
        assert!(custom.text.contains("Include Discussion questions."));
    }

    #[test]
    fn answer_embeds_question_length_and_truncated_context() {
        let context = "x".repeat(20);
        let opts = PromptOptions {
            answer_length: Some(AnswerLength::Brief),
            context_limit: 8,
            ..Default::default()
        };
        let p = build_with(&context, NoteKind::Answer, Some("Why?"), &opts).unwrap();
        assert!(p.text.starts_with("Answer length: Brief answer (1-2 sentences). "));
        assert!(p.text.contains("answer this question: Why?"));
        assert!(p.text.ends_with("xxxxxxxx..."));
        assert!(!p.text.contains(&"x".repeat(9)));
    }

    #[test]
    fn temperatures() {
        assert_eq!(build(TEXT, NoteKind::Summary, None).unwrap().temperature, 0.4);
        assert_eq!(build(TEXT, NoteKind::Overview, None).unwrap().temperature, 0.4);
        assert_eq!(build(TEXT, NoteKind::Qna, None).unwrap().temperature, 0.7);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_context("héllo", 2), "hé...");
        assert_eq!(truncate_context("short", 10), "short");
        assert_eq!(truncate_context("exact", 5), "exact");
    }
}
