//! Export a note to an editable document.
//!
//! The format follows the destination's extension: `.docx` for Word,
//! `.md` / `.markdown` for Markdown. Any other destination gets `.docx`
//! appended. Exports are one-way; edits to the file never flow back into
//! the note store.
//!
//! Like the notes file, the document is written to a temporary file next to
//! the destination and renamed into place.

pub mod docx;
pub mod layout;
pub mod markdown;

pub use layout::{layout, Block, ExportMeta, Layout};

use crate::error::KiriError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Docx,
    Markdown,
}

impl ExportFormat {
    /// Resolve the format for `dest`, returning the final path.
    pub fn for_destination(dest: &Path) -> (Self, PathBuf) {
        let ext = dest
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "docx" => (ExportFormat::Docx, dest.to_path_buf()),
            "md" | "markdown" => (ExportFormat::Markdown, dest.to_path_buf()),
            _ => {
                let mut s = dest.as_os_str().to_os_string();
                s.push(".docx");
                (ExportFormat::Docx, PathBuf::from(s))
            }
        }
    }
}

/// Export `body` under `title` to `dest`. Returns the path written.
pub fn export(title: &str, body: &str, dest: &Path) -> Result<PathBuf, KiriError> {
    export_with(&ExportMeta::new(title), body, dest)
}

/// Export with full metadata. Returns the path written.
pub fn export_with(meta: &ExportMeta, body: &str, dest: &Path) -> Result<PathBuf, KiriError> {
    let (format, path) = ExportFormat::for_destination(dest);
    let doc = layout(meta, body);

    let failed = |detail: String| KiriError::ExportFailed {
        path: path.clone(),
        detail,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| failed(e.to_string()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| failed(e.to_string()))?;
    match format {
        ExportFormat::Docx => docx::write(&doc, tmp.as_file_mut()).map_err(&failed)?,
        ExportFormat::Markdown => tmp
            .write_all(markdown::render(&doc).as_bytes())
            .map_err(|e| failed(e.to_string()))?,
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| failed(e.to_string()))?;
    tmp.persist(&path)
        .map_err(|e| failed(e.error.to_string()))?;

    info!("Exported {:?} document to {}", format, path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(
            ExportFormat::for_destination(Path::new("a/notes.docx")),
            (ExportFormat::Docx, PathBuf::from("a/notes.docx"))
        );
        assert_eq!(
            ExportFormat::for_destination(Path::new("notes.MD")).0,
            ExportFormat::Markdown
        );
        assert_eq!(
            ExportFormat::for_destination(Path::new("notes")),
            (ExportFormat::Docx, PathBuf::from("notes.docx"))
        );
        assert_eq!(
            ExportFormat::for_destination(Path::new("notes.txt")).1,
            PathBuf::from("notes.txt.docx")
        );
    }

    #[test]
    fn markdown_export_contains_title_and_body() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out").join("cells.md");
        let path = export("Cells", "The mitochondria is the powerhouse of the cell.", &dest).unwrap();
        assert_eq!(path, dest);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# Cells\n"));
        assert!(text.contains("The mitochondria is the powerhouse of the cell."));
    }

    #[test]
    fn docx_export_is_non_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = export("Cells", "• ATP\n- detail", &dir.path().join("cells")).unwrap();
        assert_eq!(path.extension().unwrap(), "docx");
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn unwritable_destination_is_export_failed() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        // A regular file cannot be used as a directory.
        let err = export("t", "b", &blocker.join("notes.md")).unwrap_err();
        assert!(matches!(err, KiriError::ExportFailed { .. }), "got {err:?}");
    }
}
