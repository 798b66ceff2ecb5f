//! API request and response types.

use crate::gateway::ExtractionGateway;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Service name reported by `/health`.
pub const SERVICE_NAME: &str = "document-text-extraction";

/// API title reported by `/info`.
pub const API_TITLE: &str = "Document Text Extraction API";

/// API description reported by `/info`.
pub const API_DESCRIPTION: &str = "Extract text from various document formats as Markdown";

/// Root liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"healthy"` while the process serves requests
    pub status: String,
    /// Service identifier
    pub service: String,
}

/// API metadata response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoResponse {
    pub title: String,
    pub description: String,
    /// API version
    pub version: String,
}

/// Error body shared by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// API server state.
///
/// One gateway (and therefore one conversion engine) for the whole process.
#[derive(Debug, Clone)]
pub struct ApiState {
    pub gateway: Arc<ExtractionGateway>,
}
