//! API server setup and configuration.

use std::{
    future::Future,
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{config::GatewayConfig, error::ServerError, gateway::ExtractionGateway};

use super::{
    handlers::{extract_text_handler, health_handler, info_handler, root_handler},
    types::ApiState,
};

/// Build the CORS layer from the configured origin list.
///
/// An empty list or `*` allows any origin without credentials. An explicit
/// list allows credentials and mirrors the requested methods and headers,
/// since credentials cannot be combined with wildcards.
pub fn cors_layer(config: &GatewayConfig) -> CorsLayer {
    if config.allows_any_origin() {
        tracing::warn!(
            "CORS configured to allow all origins. For production, pass --allowed-origins \
             (or DOCTEXT_ALLOWED_ORIGINS) with the front-end origins that may call this API"
        );
        return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| o.trim().parse::<HeaderValue>().ok())
        .collect();
    tracing::info!("CORS configured with {} explicit allowed origin(s)", origins.len());

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Create the API router with all routes configured.
///
/// The upload limit is enforced by `DefaultBodyLimit` only: the multipart
/// reader then fails with a 413 error that [`super::ApiError`] renders as
/// `{"detail": ...}` like every other failure.
///
/// Public so the router can be nested into another axum application or
/// driven directly in tests.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use doctext_gateway::{api::create_router, ExtractionGateway, GatewayConfig};
///
/// let config = GatewayConfig::default();
/// let gateway = Arc::new(ExtractionGateway::new(&config));
/// let app = axum::Router::new().nest("/docs-api", create_router(gateway, &config));
/// ```
pub fn create_router(gateway: Arc<ExtractionGateway>, config: &GatewayConfig) -> Router {
    let state = ApiState { gateway };

    Router::new()
        .route("/", get(root_handler))
        .route("/extract-text/", post(extract_text_handler))
        .route("/extract-text", post(extract_text_handler))
        .route("/health", get(health_handler))
        .route("/info", get(info_handler))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the API server and run until the process is killed.
pub async fn serve(config: GatewayConfig) -> Result<(), ServerError> {
    serve_with_shutdown(config, std::future::pending()).await
}

/// Start the API server and stop gracefully when `shutdown` resolves.
///
/// In-flight requests are allowed to finish, so their temporary artifacts
/// are released normally.
pub async fn serve_with_shutdown<F>(config: GatewayConfig, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let ip: IpAddr = config
        .host
        .parse()
        .map_err(|e| ServerError::InvalidConfig(format!("Invalid host address: {}", e)))?;
    let addr = SocketAddr::new(ip, config.port);

    let gateway = Arc::new(ExtractionGateway::new(&config));
    tracing::debug!("{:?}", gateway);
    let app = create_router(gateway, &config);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    tracing::info!("Starting Document Text Extraction API on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)?;

    tracing::info!("Server stopped");
    Ok(())
}
