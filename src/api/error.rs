//! Mapping of request failures onto HTTP responses.

use super::types::ErrorResponse;
use crate::error::GatewayError;
use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Every error a handler can return.
///
/// Rendered as `{"detail": "..."}` with the matching status code.
#[derive(Debug)]
pub enum ApiError {
    /// Validation or conversion failure reported by the gateway.
    Gateway(GatewayError),
    /// The multipart body could not be read (malformed, too large, aborted).
    Upload(MultipartError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Gateway(GatewayError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            ApiError::Gateway(GatewayError::ConversionFailure(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upload(e) => e.status(),
        }
    }

    pub fn detail(&self) -> String {
        match self {
            ApiError::Gateway(e) => e.to_string(),
            ApiError::Upload(e) => e.body_text(),
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        ApiError::Gateway(e)
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::Upload(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            detail: self.detail(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertError;

    #[test]
    fn gateway_errors_map_to_status() {
        let e = ApiError::from(GatewayError::missing_file());
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
        assert_eq!(e.detail(), "No file provided");

        let e = ApiError::from(GatewayError::from(ConvertError::Timeout { secs: 1 }));
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(e.detail().starts_with("Error processing document: "));
    }
}
