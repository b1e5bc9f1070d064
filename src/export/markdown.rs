//! Markdown rendering of a [`Layout`].

use super::layout::{Block, Layout, EDITABLE_NOTICE};

/// Render `layout` as a Markdown document.
pub fn render(layout: &Layout) -> String {
    let mut out = format!("# {}\n\n", layout.heading);

    let mut meta = Vec::new();
    if let Some(g) = &layout.generated_with {
        meta.push(format!("**{g}**"));
    }
    if let Some(s) = &layout.source {
        meta.push(format!("Source: {s}"));
    }
    if let Some(t) = &layout.topic {
        meta.push(format!("Topic: {t}"));
    }
    meta.push(format!("*{EDITABLE_NOTICE}*"));
    // Two trailing spaces force a line break inside one paragraph.
    out.push_str(&meta.join("  \n"));
    out.push_str("\n\n");

    let mut in_list = false;
    for block in &layout.blocks {
        let (line, is_list) = match block {
            Block::SectionHeading(h) => (format!("## {h}"), false),
            Block::Paragraph(p) => (p.clone(), false),
            Block::Strong(s) => (format!("**{s}**"), false),
            Block::Bullet { text, strong: true } => (format!("- **{text}**"), true),
            Block::Bullet { text, strong: false } => (format!("- {text}"), true),
            Block::SubBullet(text) => (format!("  - {text}"), true),
            Block::Numbered { number, text } => (format!("{number}. {text}"), true),
            Block::Error(e) => (format!("> {e}"), false),
            Block::Spacer => continue,
        };

        // Consecutive list items stay together; everything else is its own paragraph.
        if !(in_list && is_list) && !out.ends_with("\n\n") {
            out.push('\n');
        }
        out.push_str(&line);
        out.push('\n');
        if !is_list {
            out.push('\n');
        }
        in_list = is_list;
    }

    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out.push('\n');
    out
}
