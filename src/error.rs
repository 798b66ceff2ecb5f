//! Error types for the doctext-gateway library.
//!
//! Three error types reflect three distinct layers:
//!
//! * [`ConvertError`]: the conversion engine could not turn a file into
//!   Markdown (unsupported format, corrupt bytes, engine missing, timeout).
//!
//! * [`GatewayError`]: what a single extraction request reports to its
//!   caller. Every engine or I/O failure collapses into
//!   [`GatewayError::ConversionFailure`]; only input validation produces
//!   [`GatewayError::InvalidRequest`].
//!
//! * [`ServerError`]: fatal start-up problems (bad configuration, port
//!   already in use). Never produced while serving a request.

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a [`crate::engine::DocumentConverter`].
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// No backend is able to read files with this extension.
    #[error("No converter available for '{extension}' files")]
    UnsupportedFormat { extension: String },

    /// A text format was uploaded but the bytes are not UTF-8.
    #[error("Document is not valid UTF-8 text: {detail}")]
    InvalidEncoding { detail: String },

    /// The bytes do not parse as the format their extension claims.
    #[error("{format} document is corrupt: {detail}")]
    CorruptDocument { format: String, detail: String },

    /// The PDF is encrypted.
    #[error("PDF '{path}' is encrypted and requires a password")]
    PasswordRequired { path: PathBuf },

    // ── Engine errors ─────────────────────────────────────────────────────
    /// The backing library or executable could not be loaded.
    #[error("Conversion engine '{engine}' is unavailable: {detail}")]
    EngineUnavailable { engine: String, detail: String },

    /// The external converter exited with a non-zero status.
    #[error("'{program}' exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// The engine produced output that is not UTF-8 Markdown.
    #[error("Conversion engine produced unreadable output: {0}")]
    InvalidOutput(String),

    /// Conversion did not finish within the configured bound.
    #[error("Conversion timed out after {secs}s")]
    Timeout { secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (e.g. a blocking task panicked).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The two user-visible outcomes of a failed extraction.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request itself is unusable; nothing was written to disk.
    #[error("{0}")]
    InvalidRequest(String),

    /// Anything that went wrong after validation.
    #[error("Error processing document: {0}")]
    ConversionFailure(#[source] ConvertError),
}

impl GatewayError {
    /// The request carried no file, or a file without a name.
    pub fn missing_file() -> Self {
        GatewayError::InvalidRequest("No file provided".to_string())
    }
}

impl From<ConvertError> for GatewayError {
    fn from(e: ConvertError) -> Self {
        GatewayError::ConversionFailure(e)
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(e: std::io::Error) -> Self {
        GatewayError::ConversionFailure(ConvertError::Io(e))
    }
}

/// Fatal errors raised while configuring or starting the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The listening socket could not be bound.
    #[error("Failed to bind {addr}: {source}\nIs another process already using the port?")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The accept loop stopped with an error.
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_failure_carries_prefix() {
        let e = GatewayError::from(ConvertError::UnsupportedFormat {
            extension: ".xyz".into(),
        });
        assert_eq!(
            e.to_string(),
            "Error processing document: No converter available for '.xyz' files"
        );
        assert!(matches!(e, GatewayError::ConversionFailure(_)));
    }

    #[test]
    fn missing_file_is_bad_request() {
        let e = GatewayError::missing_file();
        assert_eq!(e.to_string(), "No file provided");
        assert!(matches!(e, GatewayError::InvalidRequest(_)));
    }

    #[test]
    fn io_error_is_conversion_failure() {
        let io = std::io::Error::new(std::io::ErrorKind::StorageFull, "disk full");
        let e = GatewayError::from(io);
        assert!(matches!(e, GatewayError::ConversionFailure(ConvertError::Io(_))));
        assert!(e.to_string().ends_with("disk full"), "got: {e}");
    }

    #[test]
    fn command_failed_display() {
        let e = ConvertError::CommandFailed {
            program: "docling".into(),
            status: "exit status: 1".into(),
            stderr: "bad input".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("docling"), "got: {msg}");
        assert!(msg.contains("bad input"), "got: {msg}");
    }

    #[test]
    fn timeout_display() {
        let e = ConvertError::Timeout { secs: 30 };
        assert!(e.to_string().contains("30s"));
    }
}
