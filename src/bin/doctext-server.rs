//! CLI binary for doctext-gateway.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `GatewayConfig` and runs the HTTP server.

use anyhow::{Context, Result};
use clap::Parser;
use doctext_gateway::{api, ExternalCommand, GatewayConfig, PageSeparator};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Listen on all interfaces, port 8000
  doctext-server

  # Local only, with a browser front-end allowed to call the API
  doctext-server --host 127.0.0.1 --allowed-origins http://localhost:3000

  # Built-in backends only; no docling subprocess
  doctext-server --no-converter

  # Any other converter; {input} and {output_dir} are substituted
  doctext-server --converter pandoc --converter-arg '{input}' --converter-arg '-t' \
    --converter-arg 'gfm'

  # Extract a document
  curl -F "file=@report.pdf" http://localhost:8000/extract-text/

ENVIRONMENT VARIABLES:
  DOCTEXT_HOST              Bind address
  DOCTEXT_PORT              Bind port
  DOCTEXT_ALLOWED_ORIGINS   Comma-separated CORS origins
  DOCTEXT_MAX_UPLOAD_BYTES  Request body limit
  DOCTEXT_TEMP_DIR          Directory for staged uploads
  DOCTEXT_TIMEOUT           Conversion timeout in seconds (0 = none)
  DOCTEXT_SEPARATOR         Page separator
  DOCTEXT_PDFIUM_LIB        pdfium library file or directory
  DOCTEXT_CONVERTER         External converter program (default: docling)
  DOCTEXT_NO_CONVERTER      Disable the external converter
  RUST_LOG                  Overrides --verbose / --quiet
"#;

#[derive(Parser, Debug)]
#[command(
    name = "doctext-server",
    version,
    about = "HTTP API that extracts Markdown text from uploaded documents",
    long_about = "Serve POST /extract-text/: upload a document as multipart form data \
(field `file`) and receive its text as Markdown. Plain text, Markdown, CSV and TSV are \
handled natively, PDFs through pdfium, and everything else through the docling CLI \
(or another external converter, see --converter).",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to bind to.
    #[arg(long, env = "DOCTEXT_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, env = "DOCTEXT_PORT", default_value_t = 8000)]
    port: u16,

    /// Origins allowed by CORS (comma-separated). Empty or `*` allows all.
    #[arg(long, env = "DOCTEXT_ALLOWED_ORIGINS", value_delimiter = ',')]
    allowed_origins: Vec<String>,

    /// Maximum request body size in bytes.
    #[arg(long, env = "DOCTEXT_MAX_UPLOAD_BYTES", default_value_t = doctext_gateway::config::DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,

    /// Directory for staged uploads. Defaults to the system temp dir.
    #[arg(long, env = "DOCTEXT_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Conversion timeout in seconds. 0 disables it.
    #[arg(long, env = "DOCTEXT_TIMEOUT", default_value_t = doctext_gateway::config::DEFAULT_EXTRACTION_TIMEOUT_SECS)]
    timeout: u64,

    /// Page separator: none, hr, comment, or custom string.
    #[arg(long, env = "DOCTEXT_SEPARATOR", default_value = "none")]
    separator: String,

    /// pdfium shared library, or the directory containing it.
    #[arg(long, env = "DOCTEXT_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// External converter program for formats without a built-in backend.
    /// `docling` without --converter-arg uses the docling defaults.
    #[arg(long, env = "DOCTEXT_CONVERTER", default_value = "docling")]
    converter: String,

    /// Argument for the external converter (repeatable).
    #[arg(long = "converter-arg", allow_hyphen_values = true)]
    converter_args: Vec<String>,

    /// Serve with the built-in backends only.
    #[arg(long, env = "DOCTEXT_NO_CONVERTER", conflicts_with_all = ["converter", "converter_args"])]
    no_converter: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCTEXT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCTEXT_QUIET", conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn external_command(&self) -> Option<ExternalCommand> {
        if self.no_converter {
            return None;
        }
        if self.converter == "docling" && self.converter_args.is_empty() {
            return Some(ExternalCommand::docling());
        }
        Some(ExternalCommand::new(self.converter.as_str(), self.converter_args.clone()))
    }

    fn into_config(self) -> Result<GatewayConfig> {
        let mut builder = GatewayConfig::builder()
            .host(self.host.as_str())
            .port(self.port)
            .allowed_origins(
                self.allowed_origins
                    .iter()
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect(),
            )
            .max_upload_bytes(self.max_upload_bytes)
            .extraction_timeout_secs(self.timeout)
            .page_separator(PageSeparator::parse(&self.separator));

        if let Some(ref dir) = self.temp_dir {
            builder = builder.temp_dir(dir);
        }
        if let Some(ref lib) = self.pdfium_lib {
            builder = builder.pdfium_library_path(lib);
        }
        builder = match self.external_command() {
            Some(cmd) => builder.external_command(cmd),
            None => builder.no_external_command(),
        };

        builder.build().context("Invalid server configuration")
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = cli.into_config()?;
    match config.engine.external_command {
        Some(ref cmd) => tracing::info!("External converter: {} {}", cmd.program, cmd.args.join(" ")),
        None => tracing::info!("External converter disabled"),
    }

    api::serve_with_shutdown(config, shutdown_signal())
        .await
        .context("Server failed")?;

    Ok(())
}
