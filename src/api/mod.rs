//! REST API for document text extraction.
//!
//! An axum router around [`crate::ExtractionGateway`].
//!
//! # Endpoints
//!
//! - `GET /` - Liveness message
//! - `POST /extract-text/` - Extract text from an uploaded file (multipart, field `file`)
//! - `GET /health` - Health check endpoint
//! - `GET /info` - API title, description and version
//!
//! # cURL Examples
//!
//! ```bash
//! # Extract a document
//! curl -F "file=@report.pdf" http://localhost:8000/extract-text/
//!
//! # Health check
//! curl http://localhost:8000/health
//! ```

mod error;
mod handlers;
mod server;
mod types;

pub use error::ApiError;
pub use handlers::FILE_FIELD;
pub use server::{cors_layer, create_router, serve, serve_with_shutdown};
pub use types::{ApiState, ErrorResponse, HealthResponse, InfoResponse, RootResponse, SERVICE_NAME};
