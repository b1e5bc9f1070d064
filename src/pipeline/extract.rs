//! Text extraction: turn a PDF's text layer into one plain string.
//!
//! pdfium is the primary backend because it copes with the widest range of
//! real-world files. It is a C++ library loaded at runtime, so when it is
//! missing (or refuses to bind) the pure-Rust `pdf-extract` crate takes
//! over. Both are blocking and run inside `spawn_blocking`.
//!
//! pdfium is looked up in `PDFIUM_LIB_PATH` (the library file or the
//! directory holding it) and then in the system library path.

use crate::error::KiriError;
use crate::pipeline::input;
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming the pdfium library file or its directory.
pub const PDFIUM_LIB_ENV: &str = "PDFIUM_LIB_PATH";

/// Produces the plain text of a document.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract all text from the document at `path`, pages concatenated in
    /// order. Fails when the file cannot be read or carries no text.
    async fn extract(&self, path: &Path) -> Result<String, KiriError>;
}

/// The default extractor: pdfium with a `pdf-extract` fallback.
#[derive(Debug, Clone, Default)]
pub struct PdfExtractor {
    password: Option<String>,
}

impl PdfExtractor {
    pub fn new(password: Option<String>) -> Self {
        Self { password }
    }
}

#[async_trait]
impl TextExtractor for PdfExtractor {
    async fn extract(&self, path: &Path) -> Result<String, KiriError> {
        let path = input::resolve_local(path)?;
        let password = self.password.clone();

        tokio::task::spawn_blocking(move || extract_blocking(&path, password.as_deref()))
            .await
            .map_err(|e| KiriError::Internal(format!("Extraction task panicked: {e}")))?
    }
}

/// Blocking implementation: pdfium first, then `pdf-extract`.
fn extract_blocking(path: &Path, password: Option<&str>) -> Result<String, KiriError> {
    let pages = match create_pdfium() {
        Some(pdfium) => match extract_with_pdfium(&pdfium, path, password) {
            Ok(pages) => pages,
            Err(e @ (KiriError::PasswordRequired { .. } | KiriError::WrongPassword { .. })) => {
                return Err(e)
            }
            Err(e) => {
                warn!("pdfium extraction failed, falling back to pdf-extract: {}", e);
                extract_with_pdf_extract(path, password)?
            }
        },
        None => extract_with_pdf_extract(path, password)?,
    };

    let text = pages
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if text.trim().is_empty() {
        return Err(KiriError::NoText {
            path: path.to_path_buf(),
        });
    }

    info!(
        "Extracted {} chars from {} pages of {}",
        text.chars().count(),
        pages.len(),
        path.display()
    );
    Ok(text)
}

/// Bind to pdfium, or `None` when no library can be loaded.
fn create_pdfium() -> Option<Pdfium> {
    if let Some(lib) = pdfium_library_from_env() {
        match Pdfium::bind_to_library(&lib) {
            Ok(bindings) => return Some(Pdfium::new(bindings)),
            Err(e) => warn!("Failed to bind pdfium at {}: {:?}", lib.display(), e),
        }
    }

    match Pdfium::bind_to_system_library() {
        Ok(bindings) => Some(Pdfium::new(bindings)),
        Err(e) => {
            debug!("pdfium not available ({:?}); using pdf-extract", e);
            None
        }
    }
}

fn pdfium_library_from_env() -> Option<PathBuf> {
    let raw = std::env::var_os(PDFIUM_LIB_ENV)?;
    let path = PathBuf::from(raw);
    if path.is_dir() {
        Some(PathBuf::from(Pdfium::pdfium_platform_library_name_at_path(&path)))
    } else {
        Some(path)
    }
}

fn extract_with_pdfium(
    pdfium: &Pdfium,
    path: &Path,
    password: Option<&str>,
) -> Result<Vec<String>, KiriError> {
    let document = pdfium.load_pdf_from_file(path, password).map_err(|e| {
        let detail = format!("{:?}", e);
        password_error(path, password, &detail).unwrap_or_else(|| KiriError::CorruptPdf {
            path: path.to_path_buf(),
            detail,
        })
    })?;

    let mut pages = Vec::with_capacity(document.pages().len() as usize);
    for page in document.pages().iter() {
        let text = page.text().map_err(|e| KiriError::CorruptPdf {
            path: path.to_path_buf(),
            detail: format!("Failed to read page text: {:?}", e),
        })?;
        pages.push(text.all());
    }

    debug!("pdfium read {} pages", pages.len());
    Ok(pages)
}

fn extract_with_pdf_extract(path: &Path, password: Option<&str>) -> Result<Vec<String>, KiriError> {
    // pdf-extract panics on some malformed inputs instead of returning an error.
    let result = std::panic::catch_unwind(|| pdf_extract::extract_text(path)).map_err(|_| {
        KiriError::CorruptPdf {
            path: path.to_path_buf(),
            detail: "pdf-extract could not parse the document".into(),
        }
    })?;

    let text = result.map_err(|e| {
        let detail = e.to_string();
        password_error(path, password, &detail).unwrap_or_else(|| KiriError::CorruptPdf {
            path: path.to_path_buf(),
            detail,
        })
    })?;

    // Pages are separated by form feeds.
    Ok(text.split('\x0C').map(str::to_string).collect())
}

/// Map a backend error mentioning passwords or encryption to the matching
/// variant.
fn password_error(path: &Path, password: Option<&str>, detail: &str) -> Option<KiriError> {
    let lower = detail.to_lowercase();
    if !(lower.contains("password") || lower.contains("encrypt")) {
        return None;
    }
    let path = path.to_path_buf();
    Some(match password {
        Some(_) => KiriError::WrongPassword { path },
        None => KiriError::PasswordRequired { path },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Assemble a one-page PDF whose page content stream is `content`.
    fn minimal_pdf(content: &str) -> Vec<u8> {
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
             /Resources << /Font << /F1 5 0 R >> >> >>"
                .to_string(),
            format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                content.len(),
                content
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
        ];

        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }

        let xref = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for off in offsets {
            out.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref
            )
            .as_bytes(),
        );
        out
    }

    fn write_pdf(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, minimal_pdf(content)).unwrap();
        path
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = PdfExtractor::default()
            .extract(Path::new("/nonexistent/cells.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, KiriError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn non_pdf_is_rejected_before_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, "just some text").unwrap();
        let err = PdfExtractor::default().extract(&path).await.unwrap_err();
        assert!(matches!(err, KiriError::NotAPdf { .. }));
    }

    #[tokio::test]
    async fn extracts_text_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pdf(
            dir.path(),
            "cell.pdf",
            "BT /F1 12 Tf 72 720 Td (Mitochondria) Tj ET",
        );
        let text = PdfExtractor::default().extract(&path).await.unwrap();
        assert!(text.contains("Mitochondria"), "got {text:?}");
    }

    #[tokio::test]
    async fn page_without_text_is_no_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pdf(dir.path(), "scan.pdf", "0 0 m 10 10 l S");
        let err = PdfExtractor::default().extract(&path).await.unwrap_err();
        assert!(matches!(err, KiriError::NoText { .. }), "got {err:?}");
    }

    #[test]
    fn password_errors_are_classified() {
        let p = Path::new("a.pdf");
        assert!(matches!(
            password_error(p, None, "PdfiumLibraryInternalError(PasswordError)"),
            Some(KiriError::PasswordRequired { .. })
        ));
        assert!(matches!(
            password_error(p, Some("x"), "document is encrypted"),
            Some(KiriError::WrongPassword { .. })
        ));
        assert!(password_error(p, None, "unexpected EOF").is_none());
    }
}
