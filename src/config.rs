//! Configuration types for the extraction gateway.
//!
//! Everything the server and the conversion engine can be tuned with lives in
//! [`GatewayConfig`], built via its [`GatewayConfigBuilder`]. The binary maps
//! its command-line flags onto the builder; embedders and tests use the
//! builder directly.

use crate::error::ServerError;
use axum::http::HeaderValue;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default upload limit: 100 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Default bound on a single conversion, in seconds.
pub const DEFAULT_EXTRACTION_TIMEOUT_SECS: u64 = 300;

/// Configuration for the extraction gateway.
///
/// # Example
/// ```rust
/// use doctext_gateway::GatewayConfig;
///
/// let config = GatewayConfig::builder()
///     .host("127.0.0.1")
///     .port(9000)
///     .allowed_origins(vec!["https://app.example.com".to_string()])
///     .build()
///     .unwrap();
/// assert_eq!(config.port, 9000);
/// ```
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address to bind to. Default: `0.0.0.0` (all interfaces).
    pub host: String,

    /// Port to bind to. Default: 8000.
    pub port: u16,

    /// Origins allowed to call the API from a browser.
    ///
    /// Empty, or containing `"*"`, allows every origin. Default: empty.
    pub allowed_origins: Vec<String>,

    /// Maximum request body size in bytes. Default: 100 MiB.
    pub max_upload_bytes: usize,

    /// Directory for temporary artifacts. `None` uses the system temp dir.
    pub temp_dir: Option<PathBuf>,

    /// Upper bound for one conversion in seconds. `0` disables the bound.
    /// Default: 300.
    pub extraction_timeout_secs: u64,

    /// Conversion engine settings.
    pub engine: EngineConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            allowed_origins: Vec::new(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            temp_dir: None,
            extraction_timeout_secs: DEFAULT_EXTRACTION_TIMEOUT_SECS,
            engine: EngineConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Create a new builder for `GatewayConfig`.
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder {
            config: Self::default(),
        }
    }

    /// The extraction timeout, or `None` when disabled.
    pub fn extraction_timeout(&self) -> Option<Duration> {
        match self.extraction_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Whether CORS should accept any origin.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o.trim() == "*")
    }
}

/// Builder for [`GatewayConfig`].
#[derive(Debug)]
pub struct GatewayConfigBuilder {
    config: GatewayConfig,
}

impl GatewayConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.config.allowed_origins = origins;
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = Some(dir.into());
        self
    }

    pub fn extraction_timeout_secs(mut self, secs: u64) -> Self {
        self.config.extraction_timeout_secs = secs;
        self
    }

    pub fn page_separator(mut self, sep: PageSeparator) -> Self {
        self.config.engine.page_separator = sep;
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.engine.pdfium_library_path = Some(path.into());
        self
    }

    pub fn external_command(mut self, command: ExternalCommand) -> Self {
        self.config.engine.external_command = Some(command);
        self
    }

    /// Turn off the external converter; only built-in backends remain.
    pub fn no_external_command(mut self) -> Self {
        self.config.engine.external_command = None;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GatewayConfig, ServerError> {
        let c = &self.config;
        if c.host.parse::<IpAddr>().is_err() {
            return Err(ServerError::InvalidConfig(format!(
                "host must be an IP address, got '{}'",
                c.host
            )));
        }
        if c.max_upload_bytes == 0 {
            return Err(ServerError::InvalidConfig(
                "max upload size must be greater than zero".into(),
            ));
        }
        if !c.allows_any_origin() {
            for origin in &c.allowed_origins {
                HeaderValue::from_str(origin.trim()).map_err(|_| {
                    ServerError::InvalidConfig(format!("invalid CORS origin '{origin}'"))
                })?;
            }
        }
        if let Some(ref cmd) = c.engine.external_command {
            if cmd.program.trim().is_empty() {
                return Err(ServerError::InvalidConfig(
                    "external converter program must not be empty".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

/// Settings for the conversion engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Separator between pages of multi-page documents. Default: none.
    pub page_separator: PageSeparator,

    /// pdfium shared library, or a directory containing it. `None` loads the
    /// platform library from the system search path.
    pub pdfium_library_path: Option<PathBuf>,

    /// External converter used for formats without a built-in backend, and
    /// for PDFs when pdfium cannot be loaded. Default: `docling`.
    pub external_command: Option<ExternalCommand>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_separator: PageSeparator::None,
            pdfium_library_path: None,
            external_command: Some(ExternalCommand::docling()),
        }
    }
}

/// An external converter invoked as a subprocess.
///
/// `{input}` in `args` is replaced with the artifact path and `{output_dir}`
/// with a scratch directory the command may write `<stem>.md` into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// The `docling` CLI writing Markdown into the scratch directory.
    pub fn docling() -> Self {
        Self::new(
            "docling",
            ["{input}", "--to", "md", "--output", "{output_dir}"]
                .into_iter()
                .map(String::from)
                .collect(),
        )
    }
}

/// How to separate pages in the exported Markdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSeparator {
    /// No separator; pages joined with "\n\n". (default)
    #[default]
    None,
    /// Horizontal rule: "\n\n---\n\n"
    HorizontalRule,
    /// HTML comment with page number: "<!-- page N -->"
    Comment,
    /// Custom string inserted between pages.
    Custom(String),
}

impl PageSeparator {
    /// Render the separator placed before the given page (1-indexed).
    pub fn render(&self, page_num: usize) -> String {
        match self {
            PageSeparator::None => "\n\n".to_string(),
            PageSeparator::HorizontalRule => "\n\n---\n\n".to_string(),
            PageSeparator::Comment => format!("\n\n<!-- page {} -->\n\n", page_num),
            PageSeparator::Custom(s) => format!("\n\n{}\n\n", s),
        }
    }

    /// Parse the command-line spelling: `none`, `hr`, `comment`, or any
    /// other string as a custom separator.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "none" | "" => PageSeparator::None,
            "hr" | "---" => PageSeparator::HorizontalRule,
            "comment" => PageSeparator::Comment,
            _ => PageSeparator::Custom(s.to_string()),
        }
    }
}
