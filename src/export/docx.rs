//! Word (`.docx`) rendering of a [`Layout`] via `docx-rs`.
//!
//! Lists are rendered as plain paragraphs with bullet or number prefixes
//! rather than Word numbering definitions, so the file opens identically in
//! Word, LibreOffice and Google Docs without a custom style sheet.

use super::layout::{Block, Layout, EDITABLE_NOTICE};
use docx_rs::{AlignmentType, Docx, Paragraph, Run};
use std::io::{Seek, Write};

/// Dark blue used for the title and section headings.
const HEADING_COLOR: &str = "003366";
/// Red used for failed sections.
const ERROR_COLOR: &str = "F44336";

// Sizes are in half-points.
const TITLE_SIZE: usize = 48;
const SECTION_SIZE: usize = 32;

/// Build the Word document for `layout`.
pub fn build(layout: &Layout) -> Docx {
    let mut doc = Docx::new().add_paragraph(
        Paragraph::new()
            .add_run(
                Run::new()
                    .add_text(layout.heading.as_str())
                    .bold()
                    .size(TITLE_SIZE)
                    .color(HEADING_COLOR),
            )
            .align(AlignmentType::Center),
    );

    if let Some(g) = &layout.generated_with {
        doc = doc.add_paragraph(centered(Run::new().add_text(g.as_str()).bold()));
    }
    if let Some(s) = &layout.source {
        doc = doc.add_paragraph(centered(Run::new().add_text(format!("Source: {s}"))));
    }
    if let Some(t) = &layout.topic {
        doc = doc.add_paragraph(centered(Run::new().add_text(format!("Topic: {t}"))));
    }
    doc = doc
        .add_paragraph(centered(Run::new().add_text(EDITABLE_NOTICE).italic()))
        .add_paragraph(Paragraph::new());

    for block in &layout.blocks {
        doc = doc.add_paragraph(paragraph_for(block));
    }
    doc
}

/// Write the packed document to `writer`.
pub fn write<W: Write + Seek>(layout: &Layout, writer: W) -> Result<(), String> {
    build(layout).build().pack(writer).map_err(|e| e.to_string())
}

fn centered(run: Run) -> Paragraph {
    Paragraph::new().add_run(run).align(AlignmentType::Center)
}

fn paragraph_for(block: &Block) -> Paragraph {
    let run = match block {
        Block::SectionHeading(h) => Run::new()
            .add_text(h.as_str())
            .bold()
            .size(SECTION_SIZE)
            .color(HEADING_COLOR),
        Block::Paragraph(p) => Run::new().add_text(p.as_str()),
        Block::Strong(s) => Run::new().add_text(s.as_str()).bold(),
        Block::Bullet { text, strong } => {
            let run = Run::new().add_text(format!("• {text}"));
            if *strong {
                run.bold()
            } else {
                run
            }
        }
        Block::SubBullet(text) => Run::new().add_text(format!("    ◦ {text}")),
        Block::Numbered { number, text } => Run::new().add_text(format!("{number}. {text}")),
        Block::Error(e) => Run::new().add_text(e.as_str()).color(ERROR_COLOR),
        Block::Spacer => return Paragraph::new(),
    };
    Paragraph::new().add_run(run)
}
