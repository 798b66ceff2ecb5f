//! # doctext-gateway
//!
//! HTTP gateway that turns uploaded documents into Markdown text.
//!
//! A client posts a file as multipart form data. The gateway stages the bytes
//! in a temporary file that keeps the upload's extension, hands that path to a
//! conversion engine, deletes the file again and answers with JSON.
//!
//! ## Pipeline Overview
//!
//! ```text
//! POST /extract-text/ (multipart "file")
//!  │
//!  ├─ 1. Receive  axum multipart handler (api)
//!  ├─ 2. Stage    TempArtifact with the original suffix (artifact)
//!  ├─ 3. Convert  DocumentConverter chosen by extension (engine)
//!  ├─ 4. Release  temp file deleted on every path (gateway)
//!  └─ 5. Respond  {filename, content_type, text, success}
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doctext_gateway::{api, GatewayConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GatewayConfig::builder().port(8000).build()?;
//!     api::serve(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! The gateway can also be used without HTTP:
//!
//! ```rust,no_run
//! use doctext_gateway::{ExtractionGateway, GatewayConfig, UploadedFile};
//!
//! # async fn run() -> Result<(), doctext_gateway::GatewayError> {
//! let gateway = ExtractionGateway::new(&GatewayConfig::default());
//! let result = gateway
//!     .extract_text(UploadedFile::new("notes.csv", None, "a,b\n1,2\n"))
//!     .await?;
//! println!("{}", result.text);
//! # Ok(())
//! # }
//! ```
//!
//! ## Engines
//!
//! | Extension | Backend |
//! |-----------|---------|
//! | `txt`, `text`, `log`, `md`, `markdown` | read as UTF-8 |
//! | `csv`, `tsv` | rendered as a Markdown table |
//! | `pdf` | pdfium text layer (feature `pdf`) |
//! | anything else | external converter command (`docling` unless disabled) |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doctext-server` binary (clap + anyhow + tracing-subscriber) |
//! | `pdf`   | on      | Built-in PDF backend via `pdfium-render` |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod artifact;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use artifact::{file_suffix, TempArtifact};
pub use config::{EngineConfig, ExternalCommand, GatewayConfig, GatewayConfigBuilder, PageSeparator};
pub use engine::{ConvertedDocument, Converter, DocumentConverter, DocumentFormat};
pub use error::{ConvertError, GatewayError, ServerError};
pub use gateway::{ExtractionGateway, ExtractionResult, UploadedFile};
