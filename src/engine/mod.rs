//! Conversion engine: turn a file on disk into Markdown.
//!
//! The gateway only ever sees the [`DocumentConverter`] trait. The default
//! implementation, [`Converter`], routes each file to a backend chosen from
//! its extension:
//!
//! ```text
//! .txt .text .log      ──▶ text     (UTF-8 pass-through)
//! .md .markdown        ──▶ text     (pass-through)
//! .csv .tsv            ──▶ text     (GFM table)
//! .pdf                 ──▶ pdf      (pdfium text layer, feature `pdf`;
//!                                    command when pdfium cannot be loaded)
//! anything else        ──▶ command  (external converter, `docling` by default)
//! ```
//!
//! 1. [`text`]    - formats that already are text
//! 2. `pdf`       - pdfium, run in `spawn_blocking` because it is not
//!    async-safe
//! 3. [`command`] - an external CLI such as `docling`, run as a subprocess
//! 4. [`cleanup`] - whitespace and invisible-character rules applied to
//!    machine-extracted text

pub mod cleanup;
pub mod command;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod text;

use crate::config::{EngineConfig, PageSeparator};
use crate::error::ConvertError;
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Document formats the router distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentFormat {
    Text,
    Markdown,
    Csv,
    Tsv,
    Pdf,
    /// Anything else, by lowercase extension without the dot (may be empty).
    Other(String),
}

impl DocumentFormat {
    /// Classify a file by its extension, case-insensitively.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "txt" | "text" | "log" => DocumentFormat::Text,
            "md" | "markdown" => DocumentFormat::Markdown,
            "csv" => DocumentFormat::Csv,
            "tsv" => DocumentFormat::Tsv,
            "pdf" => DocumentFormat::Pdf,
            _ => DocumentFormat::Other(ext),
        }
    }

    /// Extension as shown in error messages, e.g. `.docx`.
    pub fn extension_label(&self) -> String {
        match self {
            DocumentFormat::Text => ".txt".into(),
            DocumentFormat::Markdown => ".md".into(),
            DocumentFormat::Csv => ".csv".into(),
            DocumentFormat::Tsv => ".tsv".into(),
            DocumentFormat::Pdf => ".pdf".into(),
            DocumentFormat::Other(ext) if ext.is_empty() => "extensionless".into(),
            DocumentFormat::Other(ext) => format!(".{ext}"),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Text => f.write_str("text"),
            DocumentFormat::Markdown => f.write_str("markdown"),
            DocumentFormat::Csv => f.write_str("CSV"),
            DocumentFormat::Tsv => f.write_str("TSV"),
            DocumentFormat::Pdf => f.write_str("PDF"),
            DocumentFormat::Other(ext) => write!(f, "{ext}"),
        }
    }
}

/// The document model a backend returns.
///
/// Pages are kept separate so the caller decides how they are joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedDocument {
    pub format: DocumentFormat,
    /// Markdown per page. Formats without pages have exactly one entry.
    pub pages: Vec<String>,
}

impl ConvertedDocument {
    /// A document with a single page.
    pub fn single(format: DocumentFormat, markdown: impl Into<String>) -> Self {
        Self {
            format,
            pages: vec![markdown.into()],
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Join pages into one Markdown string.
    ///
    /// A single-page document is returned unchanged. Empty pages (blank
    /// scans) are skipped so they do not produce doubled separators.
    pub fn export_to_markdown(&self, separator: &PageSeparator) -> String {
        if let [only] = self.pages.as_slice() {
            return only.clone();
        }

        let mut out = String::new();
        let mut first = true;
        for (idx, page) in self.pages.iter().enumerate() {
            if page.trim().is_empty() {
                continue;
            }
            if !first {
                out.push_str(&separator.render(idx + 1));
            }
            out.push_str(page);
            first = false;
        }
        out
    }
}

/// Anything that can convert a file on disk to a [`ConvertedDocument`].
///
/// Implementations must be safe to share between concurrent requests.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Convert the file at `path`. The file exists and is fully written for
    /// the duration of the call.
    async fn convert(&self, path: &Path) -> Result<ConvertedDocument, ConvertError>;
}

/// The default engine: routes by extension to the built-in backends.
#[derive(Debug)]
pub struct Converter {
    #[cfg(feature = "pdf")]
    pdf: pdf::PdfBackend,
    command: Option<command::CommandBackend>,
}

impl Converter {
    /// `temp_dir` holds the external converter's scratch output; `None`
    /// uses the system temp dir.
    pub fn new(config: &EngineConfig, temp_dir: Option<&Path>) -> Self {
        Self {
            #[cfg(feature = "pdf")]
            pdf: pdf::PdfBackend::new(config.pdfium_library_path.clone()),
            command: config
                .external_command
                .clone()
                .map(|cmd| command::CommandBackend::new(cmd, temp_dir.map(Path::to_path_buf))),
        }
    }

    #[cfg(feature = "pdf")]
    async fn convert_pdf(&self, path: &Path) -> Result<ConvertedDocument, ConvertError> {
        match self.pdf.convert(path).await {
            Err(ConvertError::EngineUnavailable { detail, .. }) if self.command.is_some() => {
                tracing::warn!("pdfium unavailable ({}), using external converter", detail);
                self.convert_with_command(path, DocumentFormat::Pdf).await
            }
            other => other,
        }
    }

    fn unsupported(format: &DocumentFormat) -> ConvertError {
        ConvertError::UnsupportedFormat {
            extension: format.extension_label(),
        }
    }

    async fn convert_with_command(
        &self,
        path: &Path,
        format: DocumentFormat,
    ) -> Result<ConvertedDocument, ConvertError> {
        match self.command {
            Some(ref cmd) => cmd.convert(path, format).await,
            None => Err(Self::unsupported(&format)),
        }
    }
}

#[async_trait]
impl DocumentConverter for Converter {
    fn name(&self) -> &str {
        "builtin"
    }

    async fn convert(&self, path: &Path) -> Result<ConvertedDocument, ConvertError> {
        let format = DocumentFormat::from_path(path);
        debug!("Routing {} as {}", path.display(), format);

        match format {
            DocumentFormat::Text | DocumentFormat::Markdown => text::read_text(path, format).await,
            DocumentFormat::Csv => text::read_delimited(path, b',', format).await,
            DocumentFormat::Tsv => text::read_delimited(path, b'\t', format).await,
            #[cfg(feature = "pdf")]
            DocumentFormat::Pdf => self.convert_pdf(path).await,
            other => self.convert_with_command(path, other).await,
        }
    }
}
