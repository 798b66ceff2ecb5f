//! API request handlers.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use tracing::debug;

use crate::error::GatewayError;
use crate::gateway::{ExtractionResult, UploadedFile};

use super::{
    error::ApiError,
    types::{ApiState, HealthResponse, InfoResponse, RootResponse, API_DESCRIPTION, API_TITLE, SERVICE_NAME},
};

/// Multipart field carrying the document.
pub const FILE_FIELD: &str = "file";

/// Root handler.
///
/// GET /
pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: format!("{API_TITLE} is running"),
    })
}

/// Extract endpoint handler.
///
/// POST /extract-text/
///
/// Accepts multipart form data with a single `file` part. Other parts are
/// ignored. A request that is not multipart, has no `file` part, or whose
/// `file` part has no filename is answered with 400 `No file provided`.
///
/// The body size limit is enforced at the router layer; an oversized upload
/// surfaces here as a multipart error carrying 413.
pub async fn extract_text_handler(
    State(state): State<ApiState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ExtractionResult>, ApiError> {
    let mut multipart = match multipart {
        Ok(m) => m,
        Err(rejection) => {
            debug!("Rejected non-multipart upload: {}", rejection.body_text());
            return Err(GatewayError::missing_file().into());
        }
    };

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().map(|s| s.to_string());
        let content_type = field.content_type().map(|s| s.to_string());
        let bytes = field.bytes().await?;

        upload = Some(UploadedFile {
            filename,
            content_type,
            bytes,
        });
        break;
    }

    let upload = upload.ok_or_else(GatewayError::missing_file)?;
    let result = state.gateway.extract_text(upload).await?;
    Ok(Json(result))
}

/// Health check endpoint handler.
///
/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
    })
}

/// API metadata handler.
///
/// GET /info
pub async fn info_handler() -> Json<InfoResponse> {
    Json(InfoResponse {
        title: API_TITLE.to_string(),
        description: API_DESCRIPTION.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
