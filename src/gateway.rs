//! The extraction gateway: upload in, Markdown out.
//!
//! ```text
//! UploadedFile
//!  │
//!  ├─ 1. Validate  filename present and non-empty, else InvalidRequest
//!  ├─ 2. Acquire   TempArtifact with the filename's suffix
//!  ├─ 3. Write     payload flushed to disk
//!  ├─ 4. Convert   DocumentConverter on the artifact path (bounded)
//!  ├─ 5. Release   artifact deleted, success or not
//!  └─ 6. Respond   ExtractionResult, or ConversionFailure
//! ```
//!
//! This is the single place where engine and I/O errors are translated into
//! [`GatewayError`]. The gateway holds no per-request state and is shared by
//! every request behind an `Arc`.

use crate::artifact::TempArtifact;
use crate::config::{GatewayConfig, PageSeparator};
use crate::engine::{ConvertedDocument, Converter, DocumentConverter};
use crate::error::{ConvertError, GatewayError};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// A file received from a client.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, content_type: Option<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: Some(filename.into()),
            content_type,
            bytes: bytes.into(),
        }
    }
}

/// Successful extraction, serialised as the `/extract-text/` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub filename: String,
    pub content_type: Option<String>,
    pub text: String,
    pub success: bool,
}

/// Orchestrates one extraction per call.
pub struct ExtractionGateway {
    converter: Arc<dyn DocumentConverter>,
    temp_dir: Option<PathBuf>,
    timeout: Option<Duration>,
    page_separator: PageSeparator,
}

impl std::fmt::Debug for ExtractionGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionGateway")
            .field("converter", &self.converter.name())
            .field("temp_dir", &self.temp_dir)
            .field("timeout", &self.timeout)
            .field("page_separator", &self.page_separator)
            .finish()
    }
}

impl ExtractionGateway {
    /// Gateway backed by the built-in [`Converter`].
    pub fn new(config: &GatewayConfig) -> Self {
        let converter = Converter::new(&config.engine, config.temp_dir.as_deref());
        Self::with_converter(Arc::new(converter), config)
    }

    /// Gateway backed by a caller-supplied engine.
    pub fn with_converter(converter: Arc<dyn DocumentConverter>, config: &GatewayConfig) -> Self {
        Self {
            converter,
            temp_dir: config.temp_dir.clone(),
            timeout: config.extraction_timeout(),
            page_separator: config.engine.page_separator.clone(),
        }
    }

    /// Extract Markdown text from an uploaded file.
    ///
    /// # Errors
    /// - [`GatewayError::InvalidRequest`] when the filename is missing or
    ///   empty. Nothing is written to disk.
    /// - [`GatewayError::ConversionFailure`] for every failure after that:
    ///   temp-file I/O, engine errors, timeouts.
    pub async fn extract_text(&self, upload: UploadedFile) -> Result<ExtractionResult, GatewayError> {
        let filename = match upload.filename {
            Some(name) if !name.is_empty() => name,
            _ => return Err(GatewayError::missing_file()),
        };

        let start = Instant::now();
        let size = upload.bytes.len();

        let artifact = TempArtifact::materialize(self.temp_dir.as_deref(), &filename, upload.bytes)
            .await
            .map_err(|e| {
                warn!("Could not stage '{}': {}", filename, e);
                GatewayError::from(e)
            })?;

        let outcome = self.convert_artifact(&artifact).await;
        artifact.release();

        let document = outcome.map_err(|e| {
            warn!("Extraction failed for '{}': {}", filename, e);
            GatewayError::from(e)
        })?;

        let text = document.export_to_markdown(&self.page_separator);
        info!(
            "Extracted '{}' ({} bytes, {} page(s)) → {} chars in {}ms",
            filename,
            size,
            document.page_count(),
            text.len(),
            start.elapsed().as_millis()
        );

        Ok(ExtractionResult {
            filename,
            content_type: upload.content_type,
            text,
            success: true,
        })
    }

    /// Run the engine under the configured bound.
    ///
    /// On timeout the conversion future is dropped: a converter subprocess is
    /// killed and the pdfium task stops before its next page. A page already
    /// being read by pdfium finishes in the background.
    async fn convert_artifact(&self, artifact: &TempArtifact) -> Result<ConvertedDocument, ConvertError> {
        debug!(
            "Converting {} with {}",
            artifact.path().display(),
            self.converter.name()
        );
        let conversion = self.converter.convert(artifact.path());
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, conversion)
                .await
                .map_err(|_| ConvertError::Timeout {
                    secs: limit.as_secs(),
                })?,
            None => conversion.await,
        }
    }
}
