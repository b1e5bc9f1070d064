//! Saved study notes and the kinds of material kiri can generate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// The category of generated content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    /// Detailed, structured summary of a document.
    Summary,
    /// Short overview of the key ideas.
    Overview,
    /// Question/answer pairs.
    Qna,
    /// Numbered practice questions.
    PracticeQuestions,
    /// Professor-mode answer to a free-form question.
    Answer,
}

impl NoteKind {
    /// Kinds that can be requested directly from a document.
    pub const DOCUMENT_KINDS: [NoteKind; 4] = [
        NoteKind::Summary,
        NoteKind::Overview,
        NoteKind::Qna,
        NoteKind::PracticeQuestions,
    ];

    /// Stable identifier used in the notes file and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteKind::Summary => "summary",
            NoteKind::Overview => "overview",
            NoteKind::Qna => "qna",
            NoteKind::PracticeQuestions => "practice_questions",
            NoteKind::Answer => "answer",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            NoteKind::Summary => "Summary",
            NoteKind::Overview => "Brief Overview",
            NoteKind::Qna => "Q&A",
            NoteKind::PracticeQuestions => "Practice Questions",
            NoteKind::Answer => "Answer",
        }
    }
}

impl fmt::Display for NoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "summary" => Ok(NoteKind::Summary),
            "overview" | "brief" => Ok(NoteKind::Overview),
            "qna" | "q&a" | "qa" => Ok(NoteKind::Qna),
            "practice_questions" | "practice" | "questions" => Ok(NoteKind::PracticeQuestions),
            "answer" | "professor" => Ok(NoteKind::Answer),
            other => Err(format!(
                "unknown kind '{other}' (expected summary, overview, qna, practice_questions or answer)"
            )),
        }
    }
}

/// One saved study artifact.
///
/// Notes are never edited after they are stored; they can only be deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Unique within a [`crate::store::NoteStore`].
    pub id: String,
    /// Usually the source file name, or a label chosen by the user.
    pub title: String,
    pub kind: NoteKind,
    /// Generated text.
    pub body: String,
    pub created: DateTime<Utc>,
    /// PDF the note was generated from, when there was one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    /// Question asked in professor mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    /// Model that produced the body. Absent in files written before it
    /// was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Note {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        kind: NoteKind,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            body: body.into(),
            created: Utc::now(),
            source: None,
            question: None,
            model: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_cli_spellings() {
        assert_eq!("summary".parse::<NoteKind>().unwrap(), NoteKind::Summary);
        assert_eq!("brief".parse::<NoteKind>().unwrap(), NoteKind::Overview);
        assert_eq!("Q&A".parse::<NoteKind>().unwrap(), NoteKind::Qna);
        assert_eq!(
            "practice-questions".parse::<NoteKind>().unwrap(),
            NoteKind::PracticeQuestions
        );
        assert!("poem".parse::<NoteKind>().is_err());
    }

    #[test]
    fn kind_serialises_snake_case() {
        let json = serde_json::to_string(&NoteKind::PracticeQuestions).unwrap();
        assert_eq!(json, "\"practice_questions\"");
        for kind in NoteKind::DOCUMENT_KINDS {
            assert_eq!(kind.as_str().parse::<NoteKind>().unwrap(), kind);
        }
    }

    #[test]
    fn optional_fields_are_omitted() {
        let note = Note::new("cells", "cells.pdf", NoteKind::Summary, "body");
        let json = serde_json::to_value(&note).unwrap();
        assert!(json.get("source").is_none());
        assert!(json.get("question").is_none());
        assert_eq!(json["kind"], "summary");
    }
}
