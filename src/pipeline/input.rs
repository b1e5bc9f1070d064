//! Input validation: make sure a user-supplied path is a readable PDF.
//!
//! The PDF libraries produce opaque errors for a missing file or a Word
//! document renamed to `.pdf`. Checking existence, permissions and the
//! `%PDF` magic bytes up front gives the user a precise message instead.

use crate::error::KiriError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate that `path` exists, is readable, and starts with `%PDF`.
pub fn resolve_local(path: &Path) -> Result<PathBuf, KiriError> {
    let path = path.to_path_buf();

    if !path.is_file() {
        return Err(KiriError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            match f.read_exact(&mut magic) {
                Ok(()) if &magic != b"%PDF" => {
                    return Err(KiriError::NotAPdf { path, magic });
                }
                Ok(()) => {}
                Err(_) => {
                    // Shorter than four bytes: cannot be a PDF.
                    return Err(KiriError::NotAPdf { path, magic });
                }
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(KiriError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(KiriError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}

/// File name shown to the user for a source path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_found() {
        let err = resolve_local(Path::new("/nonexistent/lecture.pdf")).unwrap_err();
        assert!(matches!(err, KiriError::FileNotFound { .. }));
    }

    #[test]
    fn directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_local(dir.path()).unwrap_err();
        assert!(matches!(err, KiriError::FileNotFound { .. }));
    }

    #[test]
    fn wrong_magic_is_not_a_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, b"PK\x03\x04 this is a zip").unwrap();
        let err = resolve_local(&path).unwrap_err();
        match err {
            KiriError::NotAPdf { magic, .. } => assert_eq!(&magic, b"PK\x03\x04"),
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[test]
    fn tiny_file_is_not_a_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.pdf");
        std::fs::write(&path, b"%P").unwrap();
        assert!(matches!(
            resolve_local(&path),
            Err(KiriError::NotAPdf { .. })
        ));
    }

    #[test]
    fn pdf_header_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.pdf");
        std::fs::write(&path, b"%PDF-1.4\n").unwrap();
        assert_eq!(resolve_local(&path).unwrap(), path);
    }

    #[test]
    fn display_name_uses_file_name() {
        assert_eq!(display_name(Path::new("/tmp/Cell Biology.pdf")), "Cell Biology.pdf");
        assert_eq!(display_name(Path::new("/")), "Unknown");
    }
}
