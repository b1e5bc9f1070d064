//! Format-neutral layout of an exported note.
//!
//! The body text a model produces is loosely structured: bullets, `Q:`/`A:`
//! pairs, numbered questions and, for chunked summaries, section breaks.
//! [`layout`] turns it into a flat list of [`Block`]s that the Word and
//! Markdown writers render one to one.

use crate::note::NoteKind;
use crate::pipeline::topic::FALLBACK_TOPIC;
use once_cell::sync::Lazy;
use regex::Regex;

/// Marker separating per-chunk parts of a summary body.
pub const SECTION_MARKER: &str = "--- SECTION BREAK ---";

/// Line shown under the title inviting edits.
pub const EDITABLE_NOTICE: &str = "Editable Notes - Feel free to modify";

/// Descriptive data printed above the body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportMeta {
    /// Note title, usually the source file name.
    pub title: String,
    /// Topic guessed from the text, preferred as the heading when present.
    pub topic: Option<String>,
    /// Source document name.
    pub source: Option<String>,
    /// Model that generated the body.
    pub model: Option<String>,
    /// Kind of note, used as a hint for the body layout.
    pub kind: Option<NoteKind>,
}

impl ExportMeta {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// One renderable unit of the body.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// "Section N" heading of a chunked body.
    SectionHeading(String),
    Paragraph(String),
    /// Bold paragraph (a `Q:` line).
    Strong(String),
    /// First-level bullet, optionally bold.
    Bullet { text: String, strong: bool },
    /// Second-level bullet.
    SubBullet(String),
    Numbered { number: usize, text: String },
    /// A section the model flagged as failed.
    Error(String),
    /// Vertical gap between sections.
    Spacer,
}

/// Everything a writer needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub heading: String,
    /// "Generated with …" line, when the model is known.
    pub generated_with: Option<String>,
    pub source: Option<String>,
    /// Topic line, only when it differs from the heading.
    pub topic: Option<String>,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SectionStyle {
    Qna,
    Questions,
    Prose,
}

static RE_NUMBERED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{1,3})[.)]\s+(.*)$").expect("valid numbered regex"));

/// Lay out `body` under the heading derived from `meta`.
pub fn layout(meta: &ExportMeta, body: &str) -> Layout {
    let heading = heading_for(meta);
    let topic = meta
        .topic
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty() && *t != heading)
        .map(str::to_string);

    let sections: Vec<&str> = body.split(SECTION_MARKER).collect();
    let numbered_sections = sections.len() > 1;
    let mut blocks = Vec::new();

    for (i, section) in sections.iter().enumerate() {
        if numbered_sections {
            blocks.push(Block::SectionHeading(format!("Section {}", i + 1)));
        }

        if section.contains("[ERROR]") {
            blocks.push(Block::Error(section.trim().to_string()));
        } else {
            match section_style(section, meta.kind) {
                SectionStyle::Qna => qna_blocks(section, &mut blocks),
                SectionStyle::Questions => question_blocks(section, &mut blocks),
                SectionStyle::Prose => prose_blocks(section, &mut blocks),
            }
        }

        if i + 1 < sections.len() {
            blocks.push(Block::Spacer);
        }
    }

    Layout {
        heading,
        generated_with: meta.model.as_ref().map(|m| format!("Generated with {m}")),
        source: meta
            .source
            .clone()
            .filter(|s| !s.is_empty() && s != "Unknown"),
        topic,
        blocks,
    }
}

/// Topic if known, else the title, else [`FALLBACK_TOPIC`].
pub fn heading_for(meta: &ExportMeta) -> String {
    let topic = meta.topic.as_deref().map(str::trim).unwrap_or("");
    if !topic.is_empty() && topic != FALLBACK_TOPIC {
        return topic.to_string();
    }
    let title = meta.title.trim();
    if !title.is_empty() && title != "Unknown" {
        return title.to_string();
    }
    FALLBACK_TOPIC.to_string()
}

fn section_style(section: &str, kind: Option<NoteKind>) -> SectionStyle {
    let head: String = section.trim_start().chars().take(100).collect();
    if kind == Some(NoteKind::Qna) || head.contains("Q:") {
        return SectionStyle::Qna;
    }
    let numbered_head = section
        .trim_start()
        .lines()
        .take(5)
        .any(|l| RE_NUMBERED.is_match(l));
    if kind == Some(NoteKind::PracticeQuestions) || numbered_head {
        return SectionStyle::Questions;
    }
    SectionStyle::Prose
}

fn qna_blocks(section: &str, out: &mut Vec<Block>) {
    for line in section.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.starts_with("Q:") {
            out.push(Block::Strong(line.to_string()));
        } else if let Some(answer) = line.strip_prefix("A:") {
            out.push(Block::Bullet {
                text: answer.trim().to_string(),
                strong: false,
            });
        } else {
            out.push(Block::Paragraph(line.to_string()));
        }
    }
}

fn question_blocks(section: &str, out: &mut Vec<Block>) {
    for line in section.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match RE_NUMBERED.captures(line) {
            Some(caps) => {
                let number = caps[1].parse().unwrap_or(0);
                out.push(Block::Numbered {
                    number,
                    text: caps[2].trim().to_string(),
                });
            }
            None => out.push(Block::Paragraph(line.to_string())),
        }
    }
}

fn prose_blocks(section: &str, out: &mut Vec<Block>) {
    for line in section.lines() {
        if line.starts_with("---") {
            continue;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix('•') {
            out.push(Block::Bullet {
                text: rest.trim().to_string(),
                strong: true,
            });
        } else if let Some(rest) = line.strip_prefix('-') {
            out.push(Block::SubBullet(rest.trim().to_string()));
        } else {
            out.push(Block::Paragraph(line.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> ExportMeta {
        ExportMeta {
            title: "cells.pdf".into(),
            topic: Some("Cell Biology".into()),
            source: Some("cells.pdf".into()),
            model: Some("gemma3:4b-it-qat".into()),
            kind: None,
        }
    }

    #[test]
    fn heading_prefers_topic_then_title() {
        assert_eq!(heading_for(&meta()), "Cell Biology");
        let mut m = meta();
        m.topic = Some(FALLBACK_TOPIC.into());
        assert_eq!(heading_for(&m), "cells.pdf");
        m.title = "Unknown".into();
        assert_eq!(heading_for(&m), FALLBACK_TOPIC);
    }

    #[test]
    fn topic_line_only_when_different() {
        let l = layout(&meta(), "Body.");
        assert_eq!(l.heading, "Cell Biology");
        assert!(l.topic.is_none());
        assert_eq!(l.generated_with.as_deref(), Some("Generated with gemma3:4b-it-qat"));
        assert_eq!(l.source.as_deref(), Some("cells.pdf"));
    }

    #[test]
    fn prose_bullets_and_separators() {
        let body = "Intro line\n• Key idea\n- detail\n---\nClosing";
        let l = layout(&meta(), body);
        assert_eq!(
            l.blocks,
            vec![
                Block::Paragraph("Intro line".into()),
                Block::Bullet { text: "Key idea".into(), strong: true },
                Block::SubBullet("detail".into()),
                Block::Paragraph("Closing".into()),
            ]
        );
    }

    #[test]
    fn qna_layout() {
        let body = "Q: What is ATP?\nA: The energy currency.\n\nQ: Where is it made?\nA: Mitochondria.";
        let l = layout(&meta(), body);
        assert_eq!(l.blocks[0], Block::Strong("Q: What is ATP?".into()));
        assert_eq!(
            l.blocks[1],
            Block::Bullet { text: "The energy currency.".into(), strong: false }
        );
        assert_eq!(l.blocks.len(), 4);
    }

    #[test]
    fn numbered_questions() {
        let body = "1. Define osmosis.\n2) Explain diffusion.\nBonus: discuss.";
        let l = layout(&meta(), body);
        assert_eq!(
            l.blocks,
            vec![
                Block::Numbered { number: 1, text: "Define osmosis.".into() },
                Block::Numbered { number: 2, text: "Explain diffusion.".into() },
                Block::Paragraph("Bonus: discuss.".into()),
            ]
        );
    }

    #[test]
    fn sections_and_errors() {
        let body = format!("First part.{}[ERROR] chunk 2 failed", "\n\n--- SECTION BREAK ---\n\n");
        let l = layout(&meta(), &body);
        assert_eq!(
            l.blocks,
            vec![
                Block::SectionHeading("Section 1".into()),
                Block::Paragraph("First part.".into()),
                Block::Spacer,
                Block::SectionHeading("Section 2".into()),
                Block::Error("[ERROR] chunk 2 failed".into()),
            ]
        );
    }

    #[test]
    fn kind_hint_forces_layout() {
        let mut m = meta();
        m.kind = Some(NoteKind::Qna);
        let l = layout(&m, "Intro without markers\nA: answer");
        assert_eq!(l.blocks[0], Block::Paragraph("Intro without markers".into()));
        assert!(matches!(l.blocks[1], Block::Bullet { strong: false, .. }));
    }
}
