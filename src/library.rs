//! Discovery of PDF files on disk.

use crate::error::KiriError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// One PDF found by [`scan_pdfs`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdfEntry {
    pub path: PathBuf,
    pub size: u64,
}

impl PdfEntry {
    /// File name for display.
    pub fn name(&self) -> String {
        crate::pipeline::input::display_name(&self.path)
    }
}

/// List every `.pdf` file under `dir`, recursively, sorted by path.
///
/// Unreadable subdirectories are skipped. Fails with
/// [`KiriError::FileNotFound`] when `dir` itself is not a directory.
pub fn scan_pdfs(dir: &Path) -> Result<Vec<PdfEntry>, KiriError> {
    if !dir.is_dir() {
        return Err(KiriError::FileNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut entries: Vec<PdfEntry> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| match e {
            Ok(e) => Some(e),
            Err(err) => {
                debug!("Skipping unreadable entry: {}", err);
                None
            }
        })
        .filter(|e| e.file_type().is_file() && is_pdf(e.path()))
        .map(|e| PdfEntry {
            size: e.metadata().map(|m| m.len()).unwrap_or(0),
            path: e.into_path(),
        })
        .collect();

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Human-readable size: `0 B`, `512.0 B`, `1.5 KB`, `3.2 MB`, `1.0 GB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512.0 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3.0 GB");
        assert_eq!(format_file_size(5000 * 1024 * 1024 * 1024), "5000.0 GB");
    }

    #[test]
    fn scan_finds_pdfs_recursively() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("b.pdf"), b"%PDF-1.4").unwrap();
        std::fs::write(dir.path().join("sub").join("a.PDF"), b"%PDF").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let found = scan_pdfs(dir.path()).unwrap();
        let names: Vec<String> = found.iter().map(PdfEntry::name).collect();
        assert_eq!(names, ["b.pdf", "a.PDF"]);
        assert_eq!(found[0].size, 8);
    }

    #[test]
    fn scan_of_missing_dir_fails() {
        assert!(matches!(
            scan_pdfs(Path::new("/nonexistent/library")),
            Err(KiriError::FileNotFound { .. })
        ));
    }
}
