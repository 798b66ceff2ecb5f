//! PDF backend: read the text layer of every page via pdfium.
//!
//! `pdfium-render` wraps a C++ library that keeps thread-local state and
//! blocks, so all pdfium calls run inside `tokio::task::spawn_blocking`.
//! Bindings are created per conversion; the shared library itself is loaded
//! once by the OS.
//!
//! A blocking task cannot be aborted. When the calling future is dropped
//! (timeout, client disconnect) a shared flag is raised and the task stops
//! before the next page.
//!
//! Scanned PDFs without a text layer produce empty pages. OCR belongs to the
//! external converter (`--converter docling`).

use super::cleanup::clean_extracted_text;
use super::{ConvertedDocument, DocumentFormat};
use crate::error::ConvertError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Raises the flag when dropped, i.e. when the awaiting future goes away.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

fn ensure_not_cancelled(cancelled: &AtomicBool, page: usize) -> Result<(), ConvertError> {
    if cancelled.load(Ordering::Relaxed) {
        return Err(ConvertError::Internal(format!(
            "PDF extraction abandoned before page {}",
            page
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct PdfBackend {
    library_path: Option<PathBuf>,
}

impl PdfBackend {
    /// `library_path` is the pdfium shared library or the directory holding
    /// it. `None` binds to the system library.
    pub fn new(library_path: Option<PathBuf>) -> Self {
        Self { library_path }
    }

    pub async fn convert(&self, path: &Path) -> Result<ConvertedDocument, ConvertError> {
        let path = path.to_path_buf();
        let library_path = self.library_path.clone();
        let cancelled = Arc::new(AtomicBool::new(false));
        let _guard = CancelOnDrop(Arc::clone(&cancelled));

        tokio::task::spawn_blocking(move || {
            extract_pages_blocking(&path, library_path.as_deref(), &cancelled)
        })
        .await
        .map_err(|e| ConvertError::Internal(format!("PDF task panicked: {}", e)))?
    }
}

fn bind(library_path: Option<&Path>) -> Result<Pdfium, ConvertError> {
    let bindings = match library_path {
        Some(p) if p.is_dir() => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(p))
        }
        Some(p) => Pdfium::bind_to_library(p),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| ConvertError::EngineUnavailable {
        engine: "pdfium".to_string(),
        detail: format!("{:?}", e),
    })?;
    Ok(Pdfium::new(bindings))
}

/// Blocking implementation of text extraction.
fn extract_pages_blocking(
    pdf_path: &Path,
    library_path: Option<&Path>,
    cancelled: &AtomicBool,
) -> Result<ConvertedDocument, ConvertError> {
    let pdfium = bind(library_path)?;

    let document = pdfium.load_pdf_from_file(pdf_path, None).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            ConvertError::PasswordRequired {
                path: pdf_path.to_path_buf(),
            }
        } else {
            ConvertError::CorruptDocument {
                format: DocumentFormat::Pdf.to_string(),
                detail: err_str,
            }
        }
    })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let mut texts = Vec::with_capacity(total_pages);
    for (idx, page) in pages.iter().enumerate() {
        ensure_not_cancelled(cancelled, idx + 1)?;
        let text = page.text().map_err(|e| ConvertError::CorruptDocument {
            format: DocumentFormat::Pdf.to_string(),
            detail: format!("page {}: {:?}", idx + 1, e),
        })?;
        let cleaned = clean_extracted_text(&text.all());
        debug!("Page {} → {} chars", idx + 1, cleaned.len());
        texts.push(cleaned);
    }

    Ok(ConvertedDocument {
        format: DocumentFormat::Pdf,
        pages: texts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn garbage_bytes_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"definitely not a pdf").unwrap();

        // Corrupt when pdfium is installed, unavailable when it is not;
        // never a success.
        let err = PdfBackend::default().convert(&path).await.unwrap_err();
        assert!(
            matches!(
                err,
                ConvertError::CorruptDocument { .. } | ConvertError::EngineUnavailable { .. }
            ),
            "got: {err:?}"
        );
    }

    #[tokio::test]
    async fn missing_library_is_engine_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let backend = PdfBackend::new(Some(dir.path().join("libpdfium-missing.so")));
        let err = backend.convert(&path).await.unwrap_err();
        assert!(matches!(err, ConvertError::EngineUnavailable { .. }), "got: {err:?}");
    }

    #[test]
    fn dropped_guard_stops_page_loop() {
        let flag = Arc::new(AtomicBool::new(false));
        assert!(ensure_not_cancelled(&flag, 1).is_ok());

        drop(CancelOnDrop(Arc::clone(&flag)));
        let err = ensure_not_cancelled(&flag, 4).unwrap_err();
        assert!(err.to_string().contains("before page 4"), "got: {err}");
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_conversion_raises_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let observed = Arc::clone(&flag);

        let work = async move {
            let _guard = CancelOnDrop(flag);
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        };
        assert!(tokio::time::timeout(std::time::Duration::from_secs(1), work)
            .await
            .is_err());
        assert!(observed.load(Ordering::Relaxed));
    }
}
